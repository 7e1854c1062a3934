//! Column classification and natural ordering
//!
//! The engine offers data columns to color/marker/axis menus filtered by
//! kind. Everything the engine derives carries the `reef:` prefix and is
//! excluded. Menus and factors are ordered with a natural,
//! numeric-substring-aware comparison so that `item10` sorts after `item2`.

use polars::prelude::*;
use std::cmp::Ordering;

use crate::constants::DERIVED_PREFIX;
use crate::data::Table;

/// Compare two strings naturally: runs of digits compare by numeric value,
/// everything else byte-wise. Ties fall back to the full lexical order so
/// the comparison stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let anum = take_digits(&mut ai);
                    let bnum = take_digits(&mut bi);
                    let ord = compare_digit_runs(&anum, &bnum);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = ac.cmp(&bc);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

fn take_digits(iter: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut out = String::new();
    while let Some(c) = iter.peek() {
        if c.is_ascii_digit() {
            out.push(*c);
            iter.next();
        } else {
            break;
        }
    }
    out
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Sort strings in place with `natural_cmp`
pub fn natural_sort(items: &mut [String]) {
    items.sort_by(|a, b| natural_cmp(a, b));
}

/// Returns all data columns in the table, sorted naturally. Columns derived
/// by the engine (`reef:` prefix) are excluded.
pub fn data_columns(table: &Table) -> Vec<String> {
    let mut names: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| !name.starts_with(DERIVED_PREFIX))
        .collect();
    natural_sort(&mut names);
    names
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_integral_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Returns all data columns with scalar (numeric) values
pub fn scalar_columns(table: &Table) -> Vec<String> {
    data_columns(table)
        .into_iter()
        .filter(|name| {
            table
                .series(name)
                .map(|s| is_numeric_dtype(s.dtype()))
                .unwrap_or(false)
        })
        .collect()
}

/// Returns all scalar data columns without any missing value. Dimensionality
/// reduction requires a dense matrix, so only these qualify.
pub fn dense_scalar_columns(table: &Table) -> Vec<String> {
    scalar_columns(table)
        .into_iter()
        .filter(|name| {
            table
                .series(name)
                .map(|s| s.null_count() == 0)
                .unwrap_or(false)
        })
        .collect()
}

/// Returns all data columns with categorical (string) values
pub fn categorical_columns(table: &Table) -> Vec<String> {
    data_columns(table)
        .into_iter()
        .filter(|name| {
            table
                .series(name)
                .map(|s| matches!(s.dtype(), DataType::String))
                .unwrap_or(false)
        })
        .collect()
}

/// Returns all data columns with integral values
pub fn integral_columns(table: &Table) -> Vec<String> {
    data_columns(table)
        .into_iter()
        .filter(|name| {
            table
                .series(name)
                .map(|s| is_integral_dtype(s.dtype()))
                .unwrap_or(false)
        })
        .collect()
}

/// Returns all columns usable as labels (categorical + integral), the
/// candidate set for color and marker maps
pub fn label_columns(table: &Table) -> Vec<String> {
    let mut out = categorical_columns(table);
    out.extend(integral_columns(table));
    out
}
