//! Navigating and modifying JSON trees with key paths.

use serde_json::{Map, Value};

use crate::path::{KeyPath, PathError, Segment};
use crate::Error;

/// Name of a value's JSON type, for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(&*segment.as_key()),
        Value::Array(arr) => arr.get(segment.as_index()?),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(&*segment.as_key()),
        Value::Array(arr) => arr.get_mut(segment.as_index()?),
        _ => None,
    }
}

fn prefix_string(segments: &[Segment]) -> String {
    KeyPath::from_segments(segments.to_vec()).to_string()
}

/// Get a reference to the value at `path`.
///
/// Returns `None` as soon as a segment is missing or the current value
/// can't be navigated (e.g., indexing into a string).
pub fn get<'a>(tree: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.iter().try_fold(tree, step)
}

/// Get a mutable reference to the value at `path`.
pub fn get_mut<'a>(tree: &'a mut Value, path: &KeyPath) -> Option<&'a mut Value> {
    let mut cursor = tree;
    for segment in path.iter() {
        cursor = step_mut(cursor, segment)?;
    }
    Some(cursor)
}

/// Set a value at `path`, creating intermediate objects as needed.
///
/// # Errors
///
/// - `PathError::RootNotAllowed` for the root path.
/// - `Error::ShapeConflict` when the path runs through a scalar, or uses a
///   key segment on an array.
/// - `Error::IndexOutOfBounds` when an index segment points past the end of
///   an array (the final segment may equal the length, which appends).
///
/// The tree is untouched when an error is returned.
pub fn set(tree: &mut Value, path: &KeyPath, value: Value) -> Result<(), Error> {
    let (parent, last) = path.split_last().ok_or(PathError::RootNotAllowed)?;

    // Validate the whole walk before creating anything so a rejected set
    // leaves no empty intermediate objects behind.
    check_walk(tree, parent)?;

    let mut cursor = tree;
    for segment in parent {
        cursor = match cursor {
            Value::Object(map) => map
                .entry(segment.as_key().into_owned())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(arr) => {
                let len = arr.len();
                let index = segment.as_index().ok_or_else(|| Error::ShapeConflict {
                    path: prefix_string(parent),
                    found: "array",
                })?;
                arr.get_mut(index).ok_or_else(|| Error::IndexOutOfBounds {
                    path: prefix_string(parent),
                    index,
                    len,
                })?
            }
            other => {
                return Err(Error::ShapeConflict {
                    path: prefix_string(parent),
                    found: kind(other),
                })
            }
        };
    }

    match cursor {
        Value::Object(map) => {
            map.insert(last.as_key().into_owned(), value);
            Ok(())
        }
        Value::Array(arr) => match last.as_index() {
            Some(index) if index < arr.len() => {
                arr[index] = value;
                Ok(())
            }
            Some(index) if index == arr.len() => {
                arr.push(value);
                Ok(())
            }
            Some(index) => Err(Error::IndexOutOfBounds {
                path: prefix_string(parent),
                index,
                len: arr.len(),
            }),
            None => Err(Error::ShapeConflict {
                path: prefix_string(parent),
                found: "array",
            }),
        },
        other => Err(Error::ShapeConflict {
            path: prefix_string(parent),
            found: kind(other),
        }),
    }
}

/// Check that `segments` can be walked (creating missing object keys).
fn check_walk(tree: &Value, segments: &[Segment]) -> Result<(), Error> {
    let mut cursor = tree;
    for (position, segment) in segments.iter().enumerate() {
        cursor = match cursor {
            Value::Object(map) => match map.get(&*segment.as_key()) {
                Some(next) => next,
                // Everything below a missing key gets created as objects.
                None => return Ok(()),
            },
            Value::Array(arr) => match segment.as_index() {
                Some(index) => arr.get(index).ok_or_else(|| Error::IndexOutOfBounds {
                    path: prefix_string(&segments[..position]),
                    index,
                    len: arr.len(),
                })?,
                None => {
                    return Err(Error::ShapeConflict {
                        path: prefix_string(&segments[..position]),
                        found: "array",
                    })
                }
            },
            other => {
                return Err(Error::ShapeConflict {
                    path: prefix_string(&segments[..position]),
                    found: kind(other),
                })
            }
        };
    }

    match cursor {
        Value::Object(_) | Value::Array(_) => Ok(()),
        other => Err(Error::ShapeConflict {
            path: prefix_string(segments),
            found: kind(other),
        }),
    }
}

/// Remove the value at `path`, returning it if it existed.
///
/// Only the last element of an array can be removed, so no other index
/// ever changes what it points at.
///
/// # Errors
///
/// - `PathError::RootNotAllowed` for the root path.
/// - `Error::InteriorIndex` when an index before the last element of an
///   array is named. The tree is untouched.
pub fn remove(tree: &mut Value, path: &KeyPath) -> Result<Option<Value>, Error> {
    let (parent, last) = path.split_last().ok_or(PathError::RootNotAllowed)?;

    let mut cursor = tree;
    for segment in parent {
        cursor = match step_mut(cursor, segment) {
            Some(next) => next,
            None => return Ok(None),
        };
    }

    match cursor {
        Value::Object(map) => Ok(map.shift_remove(&*last.as_key())),
        Value::Array(arr) => match last.as_index() {
            Some(index) if index + 1 == arr.len() => Ok(arr.pop()),
            Some(index) if index < arr.len() => Err(Error::InteriorIndex {
                path: prefix_string(parent),
                index,
                len: arr.len(),
            }),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}
