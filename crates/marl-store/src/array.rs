//! Typed per-point value arrays and their type-erased form.

use std::any::Any;

use marl_core::PropValue;

/// An ordered sequence of property values, one per quadrature point.
///
/// Resizing upward fills new slots with `V::default()` (the type's
/// zero) and preserves existing entries; resizing downward truncates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropArray<V: PropValue> {
    values: Vec<V>,
}

impl<V: PropValue> PropArray<V> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Create an array of `n` zero-valued entries.
    pub fn with_len(n: usize) -> Self {
        Self {
            values: vec![V::default(); n],
        }
    }

    /// Number of quadrature points the array is sized for.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the array holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values as a slice.
    pub fn as_slice(&self) -> &[V] {
        &self.values
    }

    /// The values as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// The value at point `qp`, if sized.
    pub fn get(&self, qp: usize) -> Option<&V> {
        self.values.get(qp)
    }

    /// Mutable value at point `qp`, if sized.
    pub fn get_mut(&mut self, qp: usize) -> Option<&mut V> {
        self.values.get_mut(qp)
    }

    /// Iterate over the values in point order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }
}

impl<V: PropValue> std::ops::Index<usize> for PropArray<V> {
    type Output = V;

    fn index(&self, qp: usize) -> &V {
        &self.values[qp]
    }
}

impl<V: PropValue> std::ops::IndexMut<usize> for PropArray<V> {
    fn index_mut(&mut self, qp: usize) -> &mut V {
        &mut self.values[qp]
    }
}

impl<V: PropValue> FromIterator<V> for PropArray<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Object-safe view of a [`PropArray`] with the value type erased.
///
/// The store holds one `Box<dyn ErasedArray>` per generation per
/// property; typed access goes through [`as_any`](ErasedArray::as_any)
/// downcasts checked against the registry's recorded type.
pub trait ErasedArray: Any + Send {
    /// Number of points the array is sized for.
    fn len(&self) -> usize;

    /// Whether the array holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `n` points, zero-filling new slots and preserving the
    /// common prefix.
    fn resize(&mut self, n: usize);

    /// Reset every entry to the type's zero.
    fn fill_zero(&mut self);

    /// A new empty array of the same value type.
    fn clone_empty(&self) -> Box<dyn ErasedArray>;

    /// Name of the stored value type, for diagnostics.
    fn value_type_name(&self) -> &'static str;

    /// Overwrite this array with the contents of `src`.
    ///
    /// `src` must erase the same value type; `false` is returned (and
    /// nothing copied) otherwise. Used by generation rotation, where
    /// the registry guarantees matching types.
    fn copy_from(&mut self, src: &dyn ErasedArray) -> bool;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<V: PropValue> ErasedArray for PropArray<V> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn resize(&mut self, n: usize) {
        self.values.resize(n, V::default());
    }

    fn fill_zero(&mut self) {
        for v in &mut self.values {
            v.set_zero();
        }
    }

    fn clone_empty(&self) -> Box<dyn ErasedArray> {
        Box::new(PropArray::<V>::new())
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn copy_from(&mut self, src: &dyn ErasedArray) -> bool {
        match src.as_any().downcast_ref::<PropArray<V>>() {
            Some(typed) => {
                self.values.clear();
                self.values.extend_from_slice(&typed.values);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_core::Dual;

    #[test]
    fn with_len_is_zero_filled() {
        let arr = PropArray::<f64>::with_len(4);
        assert_eq!(arr.len(), 4);
        assert!(arr.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn resize_preserves_prefix() {
        let mut arr: PropArray<f64> = (0..4).map(|i| i as f64).collect();
        ErasedArray::resize(&mut arr, 8);
        assert_eq!(arr.len(), 8);
        assert_eq!(arr.as_slice()[..4], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(arr.as_slice()[4..], [0.0; 4]);
    }

    #[test]
    fn erased_copy_between_matching_types() {
        let src: PropArray<f64> = [1.0, 2.0].into_iter().collect();
        let mut dst = PropArray::<f64>::with_len(5);
        assert!(dst.copy_from(&src));
        assert_eq!(dst.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn erased_copy_rejects_mismatched_types() {
        let src = PropArray::<f64>::with_len(2);
        let mut dst = PropArray::<Dual>::with_len(2);
        assert!(!dst.copy_from(&src));
        assert_eq!(dst.len(), 2);
    }

    #[test]
    fn fill_zero_resets_dual_derivatives() {
        let mut arr: PropArray<Dual> = [Dual::variable(2.0, 1)].into_iter().collect();
        arr.fill_zero();
        assert_eq!(arr[0].value(), 0.0);
        assert_eq!(arr[0].n_derivatives(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn resize_keeps_the_common_prefix_and_zero_fills(
                values in prop::collection::vec(-1e6f64..1e6, 0..32),
                new_len in 0usize..64,
            ) {
                let mut arr: PropArray<f64> = values.clone().into_iter().collect();
                ErasedArray::resize(&mut arr, new_len);
                prop_assert_eq!(arr.len(), new_len);
                for i in 0..values.len().min(new_len) {
                    prop_assert_eq!(arr[i], values[i]);
                }
                for i in values.len()..new_len {
                    prop_assert_eq!(arr[i], 0.0);
                }
            }
        }
    }
}
