//! Array converter
//!
//! Arrays cross the boundary by copy. Each dimension is converted
//! recursively down to depth 1, where elements go through the scalar
//! converter, the reference bridge or the buffer view adapter. Every level of
//! the result is rectangular: a jagged input fails as a whole.

use tracing::trace;

use hostbridge_sdk::{
    BridgeError, BridgeResult, BufferElement, ElementKind, HostArray, HostValue, ManagedArray, ScalarKind,
    TypedView,
};

use crate::buffer::{buffer_of, view_of};
use crate::config::BridgeConfig;
use crate::dispatch::Leaf;
use crate::reference::ReferenceBridge;
use crate::scalar::{FromHost, ToHost};

/// Length seen at each nesting level.
///
/// The first array visited at a level fixes the length every sibling at that
/// level must have.
#[derive(Debug)]
struct ShapeTracker {
    lengths: Vec<Option<usize>>,
}

impl ShapeTracker {
    fn new(depth: u8) -> Self {
        Self {
            lengths: vec![None; usize::from(depth)],
        }
    }

    fn check(&mut self, level: usize, found: usize) -> BridgeResult<()> {
        match self.lengths[level] {
            Some(expected) if expected != found => Err(BridgeError::ShapeMismatch {
                level,
                expected,
                found,
            }),
            Some(_) => Ok(()),
            None => {
                self.lengths[level] = Some(found);
                Ok(())
            }
        }
    }
}

/// Converts arrays of one leaf category in both directions
pub struct ArrayConverter<'a, 'r> {
    config: &'a BridgeConfig,
    references: &'a ReferenceBridge<'r>,
}

impl<'a, 'r> ArrayConverter<'a, 'r> {
    /// Create a converter using `references` for reference elements
    pub fn new(config: &'a BridgeConfig, references: &'a ReferenceBridge<'r>) -> Self {
        Self { config, references }
    }

    /// Managed array of `depth` dimensions → fresh host array
    pub fn to_host(&self, leaf: Leaf, depth: u8, array: &ManagedArray<'r>) -> BridgeResult<HostValue<'r>> {
        let mut shape = ShapeTracker::new(depth);
        self.array_to_host(leaf, depth, 0, array, &mut shape)
    }

    /// Host array (or typed view at depth 1) → fresh managed array
    pub fn to_managed(&self, leaf: Leaf, depth: u8, value: &HostValue<'r>) -> BridgeResult<ManagedArray<'r>> {
        let mut shape = ShapeTracker::new(depth);
        self.array_to_managed(leaf, depth, 0, value, &mut shape)
    }

    fn array_to_host(
        &self,
        leaf: Leaf,
        depth: u8,
        level: usize,
        array: &ManagedArray<'r>,
        shape: &mut ShapeTracker,
    ) -> BridgeResult<HostValue<'r>> {
        trace!(level, depth, len = array.len(), "array to host");
        shape.check(level, array.len())?;

        if depth > 1 {
            let ManagedArray::Nested(children) = array else {
                return Err(BridgeError::mismatch(
                    format!("{}-dimensional array", depth),
                    array.type_name(),
                ));
            };
            let items = HostArray::with_capacity(children.len());
            for child in children {
                items.push(self.array_to_host(leaf, depth - 1, level + 1, child, shape)?);
            }
            return Ok(HostValue::Array(items));
        }

        Ok(HostValue::array(self.leaves_to_host(leaf, array)?))
    }

    fn leaves_to_host(&self, leaf: Leaf, array: &ManagedArray<'r>) -> BridgeResult<Vec<HostValue<'r>>> {
        fn all<'h, T: Copy + ToHost>(values: &[T]) -> Vec<HostValue<'h>> {
            values.iter().map(|v| (*v).to_host()).collect()
        }

        Ok(match (leaf, array) {
            (Leaf::Scalar(ScalarKind::Bool), ManagedArray::Bool(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Int8), ManagedArray::Int8(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Int16), ManagedArray::Int16(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Char), ManagedArray::Char(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Int32), ManagedArray::Int32(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Int64), ManagedArray::Int64(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Float32), ManagedArray::Float32(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Float64), ManagedArray::Float64(v)) => all(v),
            (Leaf::Scalar(ScalarKind::Text), ManagedArray::Text(v)) => {
                v.iter().map(|s| s.as_deref().to_host()).collect()
            }
            (Leaf::Buffer(kind), ManagedArray::Buffer(v)) => v
                .iter()
                .map(|b| match b {
                    Some(buffer) => HostValue::View(view_of(buffer, kind)),
                    None => HostValue::Null,
                })
                .collect(),
            (Leaf::Reference, ManagedArray::Ref(v)) => v
                .iter()
                .map(|h| match h {
                    Some(handle) => self.references.resolve(handle),
                    None => HostValue::Null,
                })
                .collect(),
            (leaf, other) => {
                return Err(BridgeError::mismatch(format!("{}[]", leaf), other.type_name()))
            }
        })
    }

    fn array_to_managed(
        &self,
        leaf: Leaf,
        depth: u8,
        level: usize,
        value: &HostValue<'r>,
        shape: &mut ShapeTracker,
    ) -> BridgeResult<ManagedArray<'r>> {
        if depth == 1 {
            if let (HostValue::View(view), Some(kind)) = (value, self.view_source(leaf)) {
                trace!(level, len = view.len(), view = view.kind().view_name(), "typed view source");
                shape.check(level, view.len())?;
                let items: Vec<HostValue<'r>> = (0..view.len()).map(|i| view.get(i)).collect();
                return self.leaves_to_managed(Leaf::Scalar(kind), &items);
            }
        }

        let HostValue::Array(array) = value else {
            return Err(BridgeError::mismatch(
                format!("{}-dimensional array", depth),
                value.type_name(),
            ));
        };
        let items = array.to_vec();
        trace!(level, depth, len = items.len(), "array to managed");
        shape.check(level, items.len())?;

        if depth > 1 {
            let children = items
                .iter()
                .map(|item| self.array_to_managed(leaf, depth - 1, level + 1, item, shape))
                .collect::<BridgeResult<Vec<_>>>()?;
            return Ok(ManagedArray::Nested(children));
        }

        self.leaves_to_managed(leaf, &items)
    }

    /// Scalar kind a typed view may be read into at depth 1
    fn view_source(&self, leaf: Leaf) -> Option<ScalarKind> {
        match leaf {
            Leaf::Scalar(kind) if self.config.typed_array_sources && kind.element_kind().is_some() => {
                Some(kind)
            }
            _ => None,
        }
    }

    fn leaves_to_managed(&self, leaf: Leaf, items: &[HostValue<'r>]) -> BridgeResult<ManagedArray<'r>> {
        fn all<T: FromHost>(items: &[HostValue<'_>]) -> BridgeResult<Vec<T>> {
            items.iter().map(|item| T::from_host(item)).collect()
        }

        Ok(match leaf {
            Leaf::Scalar(ScalarKind::Bool) => ManagedArray::Bool(all(items)?),
            Leaf::Scalar(ScalarKind::Int8) => ManagedArray::Int8(all(items)?),
            Leaf::Scalar(ScalarKind::Int16) => ManagedArray::Int16(all(items)?),
            Leaf::Scalar(ScalarKind::Char) => ManagedArray::Char(all(items)?),
            Leaf::Scalar(ScalarKind::Int32) => ManagedArray::Int32(all(items)?),
            Leaf::Scalar(ScalarKind::Int64) => ManagedArray::Int64(all(items)?),
            Leaf::Scalar(ScalarKind::Float32) => ManagedArray::Float32(all(items)?),
            Leaf::Scalar(ScalarKind::Float64) => ManagedArray::Float64(all(items)?),
            Leaf::Scalar(ScalarKind::Text) => ManagedArray::Text(all(items)?),
            Leaf::Buffer(kind) => ManagedArray::Buffer(
                items
                    .iter()
                    .map(|item| match item {
                        HostValue::Null | HostValue::Undefined => Ok(None),
                        HostValue::View(view) => buffer_of(view, kind).map(Some),
                        other => Err(BridgeError::mismatch(kind.view_name(), other.type_name())),
                    })
                    .collect::<BridgeResult<Vec<_>>>()?,
            ),
            Leaf::Reference => {
                ManagedArray::Ref(items.iter().map(|item| self.references.handle(item)).collect())
            }
        })
    }
}

// ============================================================================
// Typed-array bulk copies
// ============================================================================

/// Copy a depth-1 numeric managed array into a fresh host typed view.
///
/// `char[]` becomes a `Uint16Array`; `bool[]`, `text[]` and non-numeric
/// arrays are rejected.
pub fn typed_array_from_managed(array: &ManagedArray<'_>) -> BridgeResult<TypedView<'static>> {
    fn fill<T: BufferElement>(values: &[T]) -> TypedView<'static> {
        let view = TypedView::allocate(T::KIND, values.len());
        for (i, value) in values.iter().enumerate() {
            view.set_as(i, *value);
        }
        view
    }

    Ok(match array {
        ManagedArray::Int8(v) => fill(v),
        ManagedArray::Int16(v) => fill(v),
        ManagedArray::Char(v) => fill(v),
        ManagedArray::Int32(v) => fill(v),
        ManagedArray::Int64(v) => fill(v),
        ManagedArray::Float32(v) => fill(v),
        ManagedArray::Float64(v) => fill(v),
        other => return Err(BridgeError::mismatch("numeric array", other.type_name())),
    })
}

/// Copy a typed view into a fresh managed array.
///
/// Unsigned kinds without a managed counterpart widen: `u8` → `i16[]`,
/// `u32` → `i64[]`. `u16` becomes `char[]`.
pub fn managed_from_typed_array(view: &TypedView<'_>) -> ManagedArray<'static> {
    fn read<T: BufferElement>(view: &TypedView<'_>) -> Vec<T> {
        (0..view.len()).filter_map(|i| view.get_as::<T>(i)).collect()
    }

    match view.kind() {
        ElementKind::Int8 => ManagedArray::Int8(read(view)),
        ElementKind::Uint8 => ManagedArray::Int16(read::<u8>(view).into_iter().map(i16::from).collect()),
        ElementKind::Int16 => ManagedArray::Int16(read(view)),
        ElementKind::Uint16 => ManagedArray::Char(read(view)),
        ElementKind::Int32 => ManagedArray::Int32(read(view)),
        ElementKind::Uint32 => ManagedArray::Int64(read::<u32>(view).into_iter().map(i64::from).collect()),
        ElementKind::Int64 => ManagedArray::Int64(read(view)),
        ElementKind::Float32 => ManagedArray::Float32(read(view)),
        ElementKind::Float64 => ManagedArray::Float64(read(view)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert<'a, 'r>(config: &'a BridgeConfig, refs: &'a ReferenceBridge<'r>) -> ArrayConverter<'a, 'r> {
        ArrayConverter::new(config, refs)
    }

    #[test]
    fn test_depth_one_round_trip() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let managed = ManagedArray::Int32(vec![1, 2, 3]);
        let host = arrays.to_host(Leaf::Scalar(ScalarKind::Int32), 1, &managed).unwrap();
        assert_eq!(
            host,
            HostValue::array(vec![
                HostValue::Number(1.0),
                HostValue::Number(2.0),
                HostValue::Number(3.0)
            ])
        );
        let back = arrays.to_managed(Leaf::Scalar(ScalarKind::Int32), 1, &host).unwrap();
        assert_eq!(back, managed);
    }

    #[test]
    fn test_nested_to_host() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let managed = ManagedArray::Nested(vec![
            ManagedArray::Float64(vec![1.0, 2.0]),
            ManagedArray::Float64(vec![3.0, 4.0]),
        ]);
        let host = arrays.to_host(Leaf::Scalar(ScalarKind::Float64), 2, &managed).unwrap();
        let rows = host.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.get(1).as_array().unwrap().get(0), HostValue::Number(3.0));
    }

    #[test]
    fn test_jagged_managed_rejected() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let jagged = ManagedArray::Nested(vec![
            ManagedArray::Int8(vec![1, 2]),
            ManagedArray::Int8(vec![3]),
        ]);
        assert_eq!(
            arrays.to_host(Leaf::Scalar(ScalarKind::Int8), 2, &jagged),
            Err(BridgeError::ShapeMismatch {
                level: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_jagged_host_rejected() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let jagged = HostValue::array(vec![
            HostValue::array(vec![HostValue::Number(1.0)]),
            HostValue::array(vec![HostValue::Number(2.0), HostValue::Number(3.0)]),
        ]);
        assert!(matches!(
            arrays.to_managed(Leaf::Scalar(ScalarKind::Int32), 2, &jagged),
            Err(BridgeError::ShapeMismatch { level: 1, .. })
        ));
    }

    #[test]
    fn test_depth_mismatch() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let flat = HostValue::array(vec![HostValue::Number(1.0)]);
        assert!(matches!(
            arrays.to_managed(Leaf::Scalar(ScalarKind::Int32), 2, &flat),
            Err(BridgeError::TypeMismatch { .. })
        ));

        let managed = ManagedArray::Int32(vec![1]);
        assert!(matches!(
            arrays.to_host(Leaf::Scalar(ScalarKind::Int32), 2, &managed),
            Err(BridgeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            arrays.to_host(Leaf::Scalar(ScalarKind::Int64), 1, &managed),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_typed_view_source() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let view = TypedView::allocate(ElementKind::Float64, 2);
        view.set_as(0, 1.5f64);
        view.set_as(1, -2.0f64);
        let host = HostValue::View(view);
        let managed = arrays.to_managed(Leaf::Scalar(ScalarKind::Int32), 1, &host).unwrap();
        assert_eq!(managed, ManagedArray::Int32(vec![1, -2]));

        let disabled = BridgeConfig {
            typed_array_sources: false,
            ..BridgeConfig::default()
        };
        let strict = convert(&disabled, &refs);
        assert!(strict.to_managed(Leaf::Scalar(ScalarKind::Int32), 1, &host).is_err());
    }

    #[test]
    fn test_text_elements_nullable() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let host = HostValue::array(vec![HostValue::string("a"), HostValue::Null]);
        let managed = arrays.to_managed(Leaf::Scalar(ScalarKind::Text), 1, &host).unwrap();
        assert_eq!(managed, ManagedArray::Text(vec![Some("a".to_string()), None]));
        assert_eq!(
            arrays.to_host(Leaf::Scalar(ScalarKind::Text), 1, &managed).unwrap(),
            host
        );
    }

    #[test]
    fn test_no_partial_result() {
        let config = BridgeConfig::default();
        let refs = ReferenceBridge::new(false);
        let arrays = convert(&config, &refs);

        let host = HostValue::array(vec![HostValue::Number(1.0), HostValue::string("x")]);
        assert!(matches!(
            arrays.to_managed(Leaf::Scalar(ScalarKind::Int32), 1, &host),
            Err(BridgeError::ScalarRange { .. })
        ));
    }

    #[test]
    fn test_typed_bulk_copies() {
        let managed = ManagedArray::Char(vec![64, 65]);
        let view = typed_array_from_managed(&managed).unwrap();
        assert_eq!(view.kind(), ElementKind::Uint16);
        assert_eq!(managed_from_typed_array(&view), managed);

        assert!(typed_array_from_managed(&ManagedArray::Bool(vec![true])).is_err());

        let bytes = TypedView::allocate(ElementKind::Uint8, 1);
        bytes.set_as(0, 200u8);
        assert_eq!(managed_from_typed_array(&bytes), ManagedArray::Int16(vec![200]));
    }
}
