//! Version layout resolution
//!
//! Turns a validated [`Declaration`] into the ordered, non-overlapping
//! [`VersionLayout`]s of a [`Schema`].
//!
//! Inline declarations are resolved by interval: every version boundary
//! mentioned anywhere in the declaration splits the version line into
//! candidate intervals, each exact version gets its own interval, and one
//! unconditional interval is always added. A field takes part in an
//! interval only when its membership range and exactly one of its offset
//! declarations cover the whole interval.
//!
//! Explicit declarations map one to one onto layouts.
//!
//! Layouts are ordered exact first, then bounded (open-below first, then
//! ascending by lower and upper bound), then the unconditional one, so the
//! first layout containing a version is the most specific.

use crate::schema::access::FieldCodec;
use crate::schema::declare::{Declaration, FieldDecl, VersionDecl};
use crate::schema::{FieldEntry, FieldLayout, Schema, Structure, VersionLayout};
use std::cmp::Ordering;
use tracing::trace;
use vercodec_core::{ByteOrder, Ranged, SchemaError, StoreType, Version, VersionRange};

/// Describe, validate and resolve the schema of `T`
pub(crate) fn build_schema<T: Structure>() -> Result<Schema<T>, SchemaError> {
    let mut decl = Declaration::new(T::type_name());
    T::describe(&mut decl);
    resolve(decl)
}

/// Validate and resolve a filled-in declaration
pub(crate) fn resolve<T: 'static>(decl: Declaration<T>) -> Result<Schema<T>, SchemaError> {
    decl.validate()?;
    let type_name = decl.type_name();

    let mut layouts = if decl.versions.is_empty() {
        candidate_intervals(&decl)
            .into_iter()
            .map(|interval| inline_layout(&decl, interval))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        decl.versions
            .iter()
            .map(|version| explicit_layout(&decl, version))
            .collect::<Result<Vec<_>, _>>()?
    };

    check_overlaps(type_name, &layouts)?;
    layouts.sort_by(|a, b| compare_ranges(&a.range, &b.range));
    trace!(
        type_name,
        layouts = layouts.len(),
        fields = decl.fields.len(),
        "Resolved version layouts"
    );

    let fields = decl
        .fields
        .into_iter()
        .map(|field| FieldEntry {
            name: field.name,
            string_encoding: field.string_encodings.first().copied(),
            codec: field.codec,
        })
        .collect();
    Ok(Schema::new(type_name, fields, layouts))
}

// ============================================================================
// Inline style
// ============================================================================

fn candidate_intervals<T: 'static>(decl: &Declaration<T>) -> Vec<VersionRange> {
    let mut points: Vec<Version> = Vec::new();
    let mut exact: Vec<Version> = Vec::new();
    let mut open_below = false;
    let mut open_above = false;

    let mut visit = |range: &VersionRange| {
        if range.is_exact() {
            exact.extend(range.min);
            return;
        }
        match (range.min, range.max) {
            (None, None) => {}
            (None, Some(max)) => {
                open_below = true;
                points.push(max);
            }
            (Some(min), None) => {
                open_above = true;
                points.push(min);
            }
            (Some(min), Some(max)) => {
                points.push(min);
                points.push(max);
            }
        }
    };

    for entry in &decl.byte_orders {
        visit(&entry.range);
    }
    for entry in &decl.sizes {
        visit(&entry.range);
    }
    for field in &decl.fields {
        visit(&field.membership);
        field.offsets.iter().for_each(|e| visit(&e.range));
        field.byte_orders.iter().for_each(|e| visit(&e.range));
        field.store_types.iter().for_each(|e| visit(&e.range));
        field.data_length.iter().for_each(&mut visit);
    }

    points.sort();
    points.dedup();
    exact.sort();
    exact.dedup();

    let mut intervals = Vec::with_capacity(points.len() + exact.len() + 2);
    intervals.extend(exact.into_iter().map(VersionRange::exact));
    if let (true, Some(&first)) = (open_below, points.first()) {
        intervals.push(VersionRange::below(first));
    }
    intervals.extend(
        points
            .windows(2)
            .map(|pair| VersionRange::between(pair[0], pair[1])),
    );
    if let (true, Some(&last)) = (open_above, points.last()) {
        intervals.push(VersionRange::from(last));
    }
    intervals.push(VersionRange::any());
    intervals
}

fn pick<V: Copy>(entries: &[Ranged<V>], interval: &VersionRange) -> Option<V> {
    entries
        .iter()
        .find(|entry| entry.range.covers(interval))
        .map(|entry| entry.value)
}

fn store_for<T>(field: &FieldDecl<T>, store: Option<StoreType>) -> Option<StoreType> {
    match &field.codec {
        FieldCodec::Scalar(slot) => Some(store.unwrap_or_else(|| slot.logical())),
        _ => None,
    }
}

fn inline_layout<T: 'static>(
    decl: &Declaration<T>,
    interval: VersionRange,
) -> Result<VersionLayout, SchemaError> {
    let mut fields = Vec::new();
    let mut version_field = None;
    let mut data_length = Vec::new();

    for (index, field) in decl.fields.iter().enumerate() {
        if !field.membership.covers(&interval) {
            continue;
        }
        let Some(offset) = pick(&field.offsets, &interval) else {
            continue;
        };
        if field.version_number {
            version_field = Some(field.name);
        }
        if field.data_length.iter().any(|range| range.covers(&interval)) {
            data_length.push(field.name);
        }
        fields.push(FieldLayout {
            field: index,
            name: field.name,
            offset,
            byte_order: pick(&field.byte_orders, &interval),
            store: store_for(field, pick(&field.store_types, &interval)),
        });
    }

    finish_layout(
        decl.type_name(),
        interval,
        pick(&decl.byte_orders, &interval),
        pick(&decl.sizes, &interval),
        fields,
        version_field,
        data_length,
    )
}

// ============================================================================
// Explicit style
// ============================================================================

fn explicit_layout<T: 'static>(
    decl: &Declaration<T>,
    version: &VersionDecl,
) -> Result<VersionLayout, SchemaError> {
    let mut fields = Vec::with_capacity(version.fields.len());
    let mut version_field = None;
    let mut data_length = Vec::new();

    for entry in &version.fields {
        let field = &decl.fields[entry.field];
        if entry.version_number {
            version_field = Some(field.name);
        }
        if entry.data_length {
            data_length.push(field.name);
        }
        fields.push(FieldLayout {
            field: entry.field,
            name: field.name,
            offset: entry.offset,
            byte_order: entry.byte_order,
            store: store_for(field, entry.store),
        });
    }

    finish_layout(
        decl.type_name(),
        version.range,
        version.byte_order,
        version.size,
        fields,
        version_field,
        data_length,
    )
}

// ============================================================================
// Shared
// ============================================================================

fn finish_layout(
    type_name: &'static str,
    range: VersionRange,
    byte_order: Option<ByteOrder>,
    size: Option<u64>,
    mut fields: Vec<FieldLayout>,
    version_field: Option<&'static str>,
    data_length: Vec<&'static str>,
) -> Result<VersionLayout, SchemaError> {
    if let [first, second, ..] = data_length.as_slice() {
        return Err(SchemaError::MultipleDataLengthFields {
            type_name,
            first: *first,
            second: *second,
            range,
        });
    }

    // Stable: fields sharing an offset keep declaration order.
    fields.sort_by_key(|f| f.offset);
    let position = |name: &str| fields.iter().position(|f| f.name == name);
    let version_field = version_field.and_then(position);
    let data_length_field = data_length.first().and_then(|name| position(*name));

    Ok(VersionLayout {
        range,
        byte_order,
        size,
        fields,
        version_field,
        data_length_field,
    })
}

fn check_overlaps(type_name: &'static str, layouts: &[VersionLayout]) -> Result<(), SchemaError> {
    for (i, a) in layouts.iter().enumerate() {
        for b in &layouts[..i] {
            let clash = match (a.range.is_unbounded(), b.range.is_unbounded()) {
                (true, true) => true,
                (false, false) if a.range.is_exact() == b.range.is_exact() => {
                    a.range.overlaps(&b.range)
                }
                _ => false,
            };
            if clash {
                return Err(SchemaError::LayoutOverlap {
                    type_name,
                    first: b.range,
                    second: a.range,
                });
            }
        }
    }
    Ok(())
}

fn rank(range: &VersionRange) -> u8 {
    if range.is_exact() {
        0
    } else if range.is_unbounded() {
        2
    } else {
        1
    }
}

fn compare_ranges(a: &VersionRange, b: &VersionRange) -> Ordering {
    let upper = match (a.max, b.max) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(&y),
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.min.cmp(&b.min))
        .then(upper)
}
