use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A position in the data tree, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<PathSegment>,
}

impl DataPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parent(&self) -> Option<(DataPath, &PathSegment)> {
        let (last, rest) = self.segments.split_last()?;
        Some((
            DataPath {
                segments: rest.to_vec(),
            },
            last,
        ))
    }

    pub fn to_pointer(&self) -> String {
        self.segments
            .iter()
            .fold(String::new(), |mut acc, segment| {
                acc.push('/');
                match segment {
                    PathSegment::Key(key) => {
                        acc.push_str(&key.replace('~', "~0").replace('/', "~1"))
                    }
                    PathSegment::Index(index) => acc.push_str(&index.to_string()),
                }
                acc
            })
    }

    /// Parses an RFC 6901 pointer. All-digit segments become indices.
    pub fn from_pointer(pointer: &str) -> Option<Self> {
        if pointer.is_empty() {
            return Some(Self::root());
        }
        let rest = pointer.strip_prefix('/')?;
        let segments = rest
            .split('/')
            .map(|raw| {
                let key = raw.replace("~1", "/").replace("~0", "~");
                match key.parse::<usize>() {
                    Ok(index) if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) => {
                        PathSegment::Index(index)
                    }
                    _ => PathSegment::Key(key),
                }
            })
            .collect();
        Some(Self { segments })
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.to_pointer())
        }
    }
}

/// Getter and copy-then-replace setter for one tree position.
///
/// A child lens's setter is its parent's setter applied to the parent value
/// with one slot replaced, so every write rebuilds the path from the root and
/// leaves siblings untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Lens {
    path: DataPath,
}

impl Lens {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn at(path: DataPath) -> Self {
        Self { path }
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        Self::at(self.path.key(key))
    }

    pub fn index(&self, index: usize) -> Self {
        Self::at(self.path.index(index))
    }

    pub fn path(&self) -> &DataPath {
        &self.path
    }

    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.path
            .segments()
            .iter()
            .try_fold(root, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            })
            .filter(|value| !value.is_null())
    }

    /// Returns the new root, or `None` when the path cannot be written
    /// (a key into an array, or an index past the end of one).
    pub fn set(&self, root: &Value, value: Value) -> Option<Value> {
        let Some((parent_path, segment)) = self.path.parent() else {
            return Some(value);
        };
        let parent = Lens::at(parent_path);
        let current = parent.get(root).cloned().unwrap_or(Value::Null);
        let replaced = put(current, segment, value)?;
        parent.set(root, replaced)
    }
}

fn put(container: Value, segment: &PathSegment, value: Value) -> Option<Value> {
    match (segment, container) {
        (PathSegment::Key(_), Value::Array(_)) => None,
        (PathSegment::Key(key), Value::Object(mut map)) => {
            map.insert(key.clone(), value);
            Some(Value::Object(map))
        }
        (PathSegment::Key(key), _) => {
            let mut map = Map::new();
            map.insert(key.clone(), value);
            Some(Value::Object(map))
        }
        (PathSegment::Index(index), Value::Array(mut items)) => {
            match (*index).cmp(&items.len()) {
                std::cmp::Ordering::Less => items[*index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => return None,
            }
            Some(Value::Array(items))
        }
        (PathSegment::Index(index), Value::Object(mut map)) => {
            map.insert(index.to_string(), value);
            Some(Value::Object(map))
        }
        (PathSegment::Index(0), _) => Some(Value::Array(vec![value])),
        (PathSegment::Index(_), _) => None,
    }
}
