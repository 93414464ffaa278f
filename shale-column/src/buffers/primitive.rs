use shale_error::{shale_err, ShaleError, ShaleResult};
use shale_row::{Row, Value, ValueData};
use shale_schema::{Int96, PhysicalType};

use crate::{ColumnBuffer, Page, PageValues};

/// A fixed-width value a [`PrimitiveBuffer`] can hold natively.
///
/// The trait binds each native type to its physical column type and to the
/// payload conversions in both directions. Null payloads store their natural
/// zero as a placeholder, keeping the base buffer parallel to the level
/// arrays of any wrapping optional or repeated buffer.
pub trait NativeValue: Copy + Default + PartialOrd + Send + 'static {
    /// The physical type this native type backs.
    const PHYSICAL: PhysicalType;

    /// Extract this type's payload from a value; nulls become the zero
    /// placeholder, other payload kinds are a write error.
    fn from_value(value: &Value) -> ShaleResult<Self>;

    /// Wrap this payload back into a value, without levels.
    fn into_value(self) -> Value;

    /// A typed page view over a slice of this type.
    fn page_values(values: &[Self]) -> PageValues<'_>;

    /// Whether `self` sorts before `other` in the column's natural order.
    fn is_less(self, other: Self) -> bool {
        self < other
    }
}

macro_rules! native_value {
    ($T:ty, $physical:ident, $ctor:ident) => {
        impl NativeValue for $T {
            const PHYSICAL: PhysicalType = PhysicalType::$physical;

            fn from_value(value: &Value) -> ShaleResult<Self> {
                match value.data() {
                    ValueData::Null => Ok(<$T>::default()),
                    ValueData::$physical(v) => Ok(*v),
                    other => Err(shale_err!(
                        "cannot store {} payload in {} column",
                        other.kind_name(),
                        Self::PHYSICAL
                    )),
                }
            }

            fn into_value(self) -> Value {
                Value::$ctor(self)
            }

            fn page_values(values: &[Self]) -> PageValues<'_> {
                PageValues::$physical(values)
            }
        }
    };
}

native_value!(bool, Boolean, boolean);
native_value!(i32, Int32, int32);
native_value!(i64, Int64, int64);
native_value!(Int96, Int96, int96);
native_value!(f32, Float, float);
native_value!(f64, Double, double);

/// The typed base buffer for flat fixed-width columns.
///
/// One payload per row, in insertion order; ordering is the native order of
/// `T` (`false < true` for booleans, signed numeric order for integers and
/// floats, the 96-bit signed order for [`Int96`]).
#[derive(Debug, Clone, Default)]
pub struct PrimitiveBuffer<T: NativeValue> {
    values: Vec<T>,
}

impl<T: NativeValue> PrimitiveBuffer<T> {
    /// An empty buffer.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// An empty buffer with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: NativeValue> ColumnBuffer for PrimitiveBuffer<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn size_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<T>()
    }

    fn reset(&mut self) {
        self.values.clear();
    }

    fn clone_column(&self) -> Box<dyn ColumnBuffer> {
        Box::new(self.clone())
    }

    fn write_row(&mut self, row: &[Value]) -> ShaleResult<()> {
        for value in row {
            self.values.push(T::from_value(value)?);
        }
        Ok(())
    }

    fn read_row_at(&self, row: &mut Row, index: usize) -> ShaleResult<()> {
        match self.values.get(index) {
            None => Err(ShaleError::EndOfColumn),
            Some(value) => {
                row.push(value.into_value());
                Ok(())
            }
        }
    }

    fn is_less(&self, i: usize, j: usize) -> bool {
        T::is_less(self.values[i], self.values[j])
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.values.swap(i, j);
    }

    fn page(&mut self) -> ShaleResult<Page<'_>> {
        Ok(Page::flat(T::page_values(&self.values)))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn writes_read_back_in_order() {
        let mut buffer = PrimitiveBuffer::<i64>::with_capacity(4);
        buffer
            .write_row(&[Value::int64(3), Value::int64(1)])
            .unwrap();
        buffer.write_row(&[Value::int64(2)]).unwrap();

        let mut row = Row::new();
        for index in 0..3 {
            buffer.read_row_at(&mut row, index).unwrap();
        }
        let read: Vec<i64> = row.iter().map(|v| v.as_int64().unwrap()).collect();
        assert_eq!(read, [3, 1, 2]);
    }

    #[test]
    fn nulls_store_zero_placeholders() {
        let mut buffer = PrimitiveBuffer::<i32>::new();
        buffer.write_row(&[Value::null(), Value::int32(7)]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.values(), [0, 7]);
    }

    #[test]
    fn mismatched_payloads_are_write_errors() {
        let mut buffer = PrimitiveBuffer::<i32>::new();
        assert!(buffer.write_row(&[Value::double(0.5)]).is_err());
    }

    #[rstest]
    #[case(false, true)]
    #[case(true, false)]
    fn boolean_order(#[case] first: bool, #[case] expected: bool) {
        let mut buffer = PrimitiveBuffer::<bool>::new();
        buffer
            .write_row(&[Value::boolean(first), Value::boolean(!first)])
            .unwrap();
        assert_eq!(buffer.is_less(0, 1), expected);
    }

    #[test]
    fn clone_is_isolated() {
        let mut buffer = PrimitiveBuffer::<f64>::new();
        buffer.write_row(&[Value::double(1.0)]).unwrap();
        let snapshot = buffer.clone_column();
        buffer.write_row(&[Value::double(2.0)]).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut buffer = PrimitiveBuffer::<i32>::with_capacity(64);
        buffer.write_row(&[Value::int32(1)]).unwrap();
        buffer.reset();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.capacity() >= 64);
    }

    #[test]
    fn int96_orders_signed() {
        let mut buffer = PrimitiveBuffer::<Int96>::new();
        buffer
            .write_row(&[
                Value::int96(Int96::from(-2i64)),
                Value::int96(Int96::from(1i64)),
            ])
            .unwrap();
        assert!(buffer.is_less(0, 1));
        assert!(!buffer.is_less(1, 0));
    }
}
