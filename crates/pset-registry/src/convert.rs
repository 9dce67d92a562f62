//! Typed conversion between Rust values and stored cells.

use pset_core::codec::{self, Complex, Nil};
use pset_core::{Error, ErrorKind, Result};

use crate::cell::{AtomKind, Cell};
use crate::pset::ParameterSet;
use crate::registry::Registry;

/// Types that can be read out of a [`Cell`].
pub trait FromCell: Sized {
    /// Whether the cell has the right shape and kind for `Self`.
    ///
    /// Defaulting lookups fall back when this is false. A cell that is
    /// accepted but then fails to decode is an error.
    fn accepts(cell: &Cell) -> bool;

    fn from_cell(cell: &Cell, registry: &Registry) -> Result<Self>;
}

/// Types that can be stored as a [`Cell`].
pub trait IntoCell {
    fn into_cell(self, registry: &Registry) -> Result<Cell>;
}

fn is_atom(cell: &Cell, kind: AtomKind) -> bool {
    matches!(cell, Cell::Atom(atom) if atom.kind() == kind)
}

/// Integer atoms, and float atoms holding a whole number (`1e6`, `2.0`).
fn is_integral(cell: &Cell) -> bool {
    match cell.as_atom() {
        Some(atom) if atom.kind() == AtomKind::Integer => true,
        Some(atom) if atom.kind() == AtomKind::Float => codec::decode_int(atom.text())
            .map_or_else(|e| e.kind() != ErrorKind::TypeMismatch, |_| true),
        _ => false,
    }
}

fn integral_text(cell: &Cell) -> Result<&str> {
    match cell.as_atom() {
        Some(atom) if atom.kind() == AtomKind::Float => Ok(atom.text()),
        _ => cell.expect_atom(AtomKind::Integer),
    }
}

macro_rules! integer_cells {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromCell for $ty {
                fn accepts(cell: &Cell) -> bool {
                    is_integral(cell)
                }

                fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
                    codec::decode_integer::<$ty>(integral_text(cell)?)
                }
            }

            impl IntoCell for $ty {
                fn into_cell(self, _: &Registry) -> Result<Cell> {
                    Ok(Cell::atom(AtomKind::Integer, codec::encode_int(self as i128)))
                }
            }
        )*
    };
}

integer_cells!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl FromCell for u128 {
    fn accepts(cell: &Cell) -> bool {
        is_integral(cell)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_uint(integral_text(cell)?)
    }
}

impl IntoCell for u128 {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        Ok(Cell::atom(AtomKind::Integer, codec::encode_uint(self)))
    }
}

impl FromCell for f64 {
    fn accepts(cell: &Cell) -> bool {
        is_atom(cell, AtomKind::Float)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_float(cell.expect_atom(AtomKind::Float)?)
    }
}

impl IntoCell for f64 {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        Ok(Cell::atom(AtomKind::Float, codec::encode_float(self)?))
    }
}

impl FromCell for f32 {
    fn accepts(cell: &Cell) -> bool {
        is_atom(cell, AtomKind::Float)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_f32(cell.expect_atom(AtomKind::Float)?)
    }
}

impl IntoCell for f32 {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        f64::from(self).into_cell(registry)
    }
}

impl FromCell for bool {
    fn accepts(cell: &Cell) -> bool {
        is_atom(cell, AtomKind::Bool)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_bool(cell.expect_atom(AtomKind::Bool)?)
    }
}

impl IntoCell for bool {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        Ok(Cell::atom(AtomKind::Bool, codec::encode_bool(self)))
    }
}

impl FromCell for String {
    fn accepts(cell: &Cell) -> bool {
        is_atom(cell, AtomKind::String)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_string(cell.expect_atom(AtomKind::String)?)
    }
}

impl IntoCell for String {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        self.as_str().into_cell(registry)
    }
}

impl IntoCell for &str {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        Ok(Cell::atom(AtomKind::String, codec::encode_string(self)?))
    }
}

impl FromCell for Complex {
    fn accepts(cell: &Cell) -> bool {
        is_atom(cell, AtomKind::Complex)
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_complex(cell.expect_atom(AtomKind::Complex)?)
    }
}

impl IntoCell for Complex {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        let (re, im) = codec::encode_complex(self)?;
        Ok(Cell::atom(AtomKind::Complex, codec::join_complex(&re, &im)))
    }
}

impl FromCell for Nil {
    fn accepts(cell: &Cell) -> bool {
        cell.is_nil()
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        codec::decode_nil(cell.expect_atom(AtomKind::Nil)?)
    }
}

impl IntoCell for Nil {
    fn into_cell(self, _: &Registry) -> Result<Cell> {
        Ok(Cell::nil())
    }
}

/// `nil` reads as `None`.
impl<T: FromCell> FromCell for Option<T> {
    fn accepts(cell: &Cell) -> bool {
        cell.is_nil() || T::accepts(cell)
    }

    fn from_cell(cell: &Cell, registry: &Registry) -> Result<Self> {
        if cell.is_nil() {
            Ok(None)
        } else {
            T::from_cell(cell, registry).map(Some)
        }
    }
}

impl<T: IntoCell> IntoCell for Option<T> {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        match self {
            Some(value) => value.into_cell(registry),
            None => Ok(Cell::nil()),
        }
    }
}

impl<T: FromCell> FromCell for Vec<T> {
    fn accepts(cell: &Cell) -> bool {
        matches!(cell, Cell::Sequence(items) if items.iter().all(T::accepts))
    }

    fn from_cell(cell: &Cell, registry: &Registry) -> Result<Self> {
        match cell {
            Cell::Sequence(items) => items
                .iter()
                .map(|item| T::from_cell(item, registry))
                .collect(),
            other => Err(Error::type_mismatch(format!(
                "expected sequence, found {}",
                other.describe()
            ))),
        }
    }
}

impl<T: IntoCell> IntoCell for Vec<T> {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        self.into_iter()
            .map(|item| item.into_cell(registry))
            .collect::<Result<Vec<_>>>()
            .map(Cell::Sequence)
    }
}

impl FromCell for ParameterSet {
    fn accepts(cell: &Cell) -> bool {
        matches!(cell, Cell::Table(_))
    }

    fn from_cell(cell: &Cell, registry: &Registry) -> Result<Self> {
        match cell {
            Cell::Table(id) => registry.get(*id),
            other => Err(Error::type_mismatch(format!(
                "expected table, found {}",
                other.describe()
            ))),
        }
    }
}

/// Interns the set (and any foreign nested sets) into `registry`.
impl IntoCell for ParameterSet {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        (&self).into_cell(registry)
    }
}

impl IntoCell for &ParameterSet {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        registry.put(self).map(Cell::Table)
    }
}

impl FromCell for Cell {
    fn accepts(_: &Cell) -> bool {
        true
    }

    fn from_cell(cell: &Cell, _: &Registry) -> Result<Self> {
        Ok(cell.clone())
    }
}

/// Tables must already be present in the target registry.
impl IntoCell for Cell {
    fn into_cell(self, registry: &Registry) -> Result<Cell> {
        check_tables(&self, registry)?;
        Ok(self)
    }
}

fn check_tables(cell: &Cell, registry: &Registry) -> Result<()> {
    match cell {
        Cell::Atom(_) => Ok(()),
        Cell::Sequence(items) => items.iter().try_for_each(|item| check_tables(item, registry)),
        Cell::Table(id) if registry.contains(*id) => Ok(()),
        Cell::Table(id) => Err(Error::cant_find(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T>(value: T) -> T
    where
        T: IntoCell + FromCell,
    {
        let registry = Registry::new();
        let cell = value.into_cell(&registry).unwrap();
        T::from_cell(&cell, &registry).unwrap()
    }

    #[test]
    fn primitives() {
        assert_eq!(round_trip(-17i32), -17);
        assert_eq!(round_trip(u64::MAX), u64::MAX);
        assert_eq!(round_trip(2.5f64), 2.5);
        assert_eq!(round_trip(0.1f32), 0.1);
        assert!(round_trip(true));
        assert_eq!(round_trip(String::from("it's \"quoted\"")), "it's \"quoted\"");
        assert_eq!(round_trip(Complex::new(1.0, -2.0)), Complex::new(1.0, -2.0));
        assert_eq!(round_trip(Nil), Nil);
    }

    #[test]
    fn nested_vectors() {
        let vv = vec![vec![1i32, 2], vec![], vec![3]];
        assert_eq!(round_trip(vv.clone()), vv);
    }

    #[test]
    fn options_use_nil() {
        assert_eq!(round_trip(None::<i32>), None);
        assert_eq!(round_trip(Some(4i32)), Some(4));
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let registry = Registry::new();
        let int = 1i32.into_cell(&registry).unwrap();
        assert!(!f64::accepts(&int));
        assert_eq!(
            f64::from_cell(&int, &registry).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        let fraction = 2.5f64.into_cell(&registry).unwrap();
        assert!(!i32::accepts(&fraction));
        assert_eq!(
            i32::from_cell(&fraction, &registry).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn whole_floats_read_as_integers() {
        let registry = Registry::new();
        let million = Cell::atom(AtomKind::Float, "+1.000000e+06");
        assert!(i64::accepts(&million));
        assert_eq!(i64::from_cell(&million, &registry).unwrap(), 1_000_000);
        let two = 2.0f64.into_cell(&registry).unwrap();
        assert_eq!(u8::from_cell(&two, &registry).unwrap(), 2);
        let huge = 1e300f64.into_cell(&registry).unwrap();
        assert!(i32::accepts(&huge));
        assert_eq!(
            i32::from_cell(&huge, &registry).unwrap_err().kind(),
            ErrorKind::NumberTooLarge
        );
    }

    #[test]
    fn u128_covers_full_range() {
        assert_eq!(round_trip(u128::MAX), u128::MAX);
        assert_eq!(round_trip(7u128), 7);
    }

    #[test]
    fn narrowing_reports_too_large() {
        let registry = Registry::new();
        let cell = 300i32.into_cell(&registry).unwrap();
        assert!(u8::accepts(&cell));
        assert_eq!(
            u8::from_cell(&cell, &registry).unwrap_err().kind(),
            ErrorKind::NumberTooLarge
        );
    }

    #[test]
    fn vec_accepts_only_uniform_sequences() {
        let registry = Registry::new();
        let mixed = Cell::Sequence(vec![
            1i32.into_cell(&registry).unwrap(),
            "x".into_cell(&registry).unwrap(),
        ]);
        assert!(!Vec::<i32>::accepts(&mixed));
        assert!(Vec::<Cell>::accepts(&mixed));
    }

    #[test]
    fn foreign_table_cells_are_rejected() {
        let other = Registry::new();
        let mut pset = ParameterSet::with_registry(&other);
        pset.put("a", 1i32).unwrap();
        let cell = (&pset).into_cell(&other).unwrap();
        let err = cell.into_cell(&Registry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CantFind);
    }
}
