//! Numeric arrays and list type inference.

use crate::Value;

/// Element storage of a numeric array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

/// A dense, row-major numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: ArrayData,
}

/// A single array element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Array {
    /// A one-dimensional integer array.
    pub fn from_ints(values: Vec<i64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Int(values),
        }
    }

    /// A one-dimensional float array.
    pub fn from_floats(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Float(values),
        }
    }

    /// Build an array from a shape and matching data.
    pub fn with_shape(shape: Vec<usize>, data: ArrayData) -> Option<Self> {
        let expected: usize = shape.iter().product();
        let actual = match &data {
            ArrayData::Int(v) => v.len(),
            ArrayData::Float(v) => v.len(),
        };
        (!shape.is_empty() && expected == actual).then_some(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Length of the outermost dimension.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.shape[0] == 0
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_int(&self) -> bool {
        matches!(self.data, ArrayData::Int(_))
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Element at a flat, row-major index.
    pub fn flat(&self, index: usize) -> Option<Number> {
        match &self.data {
            ArrayData::Int(v) => v.get(index).copied().map(Number::Int),
            ArrayData::Float(v) => v.get(index).copied().map(Number::Float),
        }
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Number> + '_ {
        (0..self.size()).filter_map(|i| self.flat(i))
    }

    /// The `index`th sub-array along the outermost dimension.
    ///
    /// For a one-dimensional array this is `None`; use [`Array::flat`].
    pub fn row(&self, index: usize) -> Option<Array> {
        if self.ndim() < 2 || index >= self.len() {
            return None;
        }
        let shape = self.shape[1..].to_vec();
        let stride: usize = shape.iter().product();
        let range = index * stride..(index + 1) * stride;
        let data = match &self.data {
            ArrayData::Int(v) => ArrayData::Int(v[range].to_vec()),
            ArrayData::Float(v) => ArrayData::Float(v[range].to_vec()),
        };
        Some(Array { shape, data })
    }

    fn into_floats(self) -> Vec<f64> {
        match self.data {
            ArrayData::Int(v) => v.into_iter().map(|i| i as f64).collect(),
            ArrayData::Float(v) => v,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// Turn the items of a parenthesised list into the most specific value.
///
/// - every item an integer: integer array
/// - every item a numeric array of one common shape: an array one dimension
///   deeper, integer only when every source array is
/// - every item a number: float array
/// - anything else: the raw list
///
/// An empty list stays an empty raw list. The result depends only on the
/// multiset of item kinds, never their order.
pub fn infer_list(items: Vec<Value>) -> Value {
    if items.is_empty() {
        return Value::List(items);
    }

    if items.iter().all(|v| matches!(v, Value::Int(_))) {
        let ints = items.iter().filter_map(Value::as_int).collect();
        return Value::Array(Array::from_ints(ints));
    }

    if items.iter().all(Value::is_number) {
        let floats = items.iter().filter_map(Value::as_float).collect();
        return Value::Array(Array::from_floats(floats));
    }

    if let Some(stacked) = stack_arrays(&items) {
        return Value::Array(stacked);
    }

    Value::List(items)
}

/// Stack equally shaped arrays along a new outer dimension.
fn stack_arrays(items: &[Value]) -> Option<Array> {
    let arrays: Vec<&Array> = items.iter().map(Value::as_array).collect::<Option<_>>()?;
    let inner = arrays.first()?.shape().to_vec();
    if arrays.iter().any(|a| a.shape() != inner.as_slice()) {
        return None;
    }

    let mut shape = vec![arrays.len()];
    shape.extend_from_slice(&inner);

    let data = if arrays.iter().all(|a| a.is_int()) {
        let mut out = Vec::new();
        for a in &arrays {
            if let ArrayData::Int(v) = a.data() {
                out.extend_from_slice(v);
            }
        }
        ArrayData::Int(out)
    } else {
        ArrayData::Float(
            arrays
                .iter()
                .flat_map(|a| (*a).clone().into_floats())
                .collect(),
        )
    };
    Array::with_shape(shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ints(v: &[i64]) -> Value {
        Value::Array(Array::from_ints(v.to_vec()))
    }

    #[test]
    fn test_all_ints() {
        let v = infer_list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(v, ints(&[1, 2, 3]));
    }

    #[test]
    fn test_mixed_numbers_promote_to_float() {
        let v = infer_list(vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(v, Value::Array(Array::from_floats(vec![1.0, 2.5])));
    }

    #[test]
    fn test_non_numeric_stays_a_list() {
        let items = vec![Value::Int(1), Value::word("a")];
        assert_eq!(infer_list(items.clone()), Value::List(items));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(infer_list(vec![]), Value::List(vec![]));
    }

    #[test]
    fn test_nested_arrays() {
        let v = infer_list(vec![ints(&[0, 1, 2, 3]), ints(&[4, 5, 6, 7])]);
        let a = v.as_array().unwrap();
        assert_eq!(a.shape(), &[2, 4]);
        assert!(a.is_int());
        assert_eq!(a.row(1), Some(Array::from_ints(vec![4, 5, 6, 7])));

        let v = infer_list(vec![
            ints(&[0, 1, 2]),
            Value::Array(Array::from_floats(vec![0.5, 1.0, 2.0])),
        ]);
        let a = v.as_array().unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert!(!a.is_int());
        assert_eq!(a.flat(1), Some(Number::Float(1.0)));
    }

    #[test]
    fn test_ragged_arrays_stay_a_list() {
        let items = vec![ints(&[0, 1, 2]), ints(&[3, 4])];
        assert_eq!(infer_list(items.clone()), Value::List(items));
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        Int,
        Float,
        Word,
    }

    fn kind_of(v: &Value) -> &'static str {
        match v {
            Value::Array(a) if a.is_int() => "int-array",
            Value::Array(_) => "float-array",
            _ => "list",
        }
    }

    proptest! {
        #[test]
        fn inferred_kind_ignores_order(
            kinds in proptest::collection::vec(
                prop_oneof![Just(Kind::Int), Just(Kind::Float), Just(Kind::Word)],
                1..12,
            ),
            seed in any::<u64>(),
        ) {
            let items: Vec<Value> = kinds
                .iter()
                .enumerate()
                .map(|(i, k)| match k {
                    Kind::Int => Value::Int(i as i64),
                    Kind::Float => Value::Float(i as f64 + 0.5),
                    Kind::Word => Value::word(format!("w{i}")),
                })
                .collect();
            let mut shuffled = items.clone();
            let n = shuffled.len();
            let mut state = seed;
            for i in (1..n).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            prop_assert_eq!(kind_of(&infer_list(items)), kind_of(&infer_list(shuffled)));
        }
    }
}
