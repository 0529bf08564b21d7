//! Feature schema model.
//!
//! A [`Schema`] is an ordered list of uniquely named [`Field`]s. Whether a field
//! holds geometry or scalar data is decided once, when the field is built, through
//! its [`FieldKind`].

use std::fmt;

use geo_types::Geometry;

use crate::error::SchemaError;

/// Geometry subtype carried by a geometry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    /// Mixed or unknown subtype.
    Geometry,
}

impl GeometryType {
    /// Returns the subtype of a concrete geometry value.
    ///
    /// `Line`, `Rect` and `Triangle` are reported as the simple shapes they
    /// describe.
    #[must_use]
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => Self::Point,
            Geometry::Line(_) | Geometry::LineString(_) => Self::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => Self::Polygon,
            Geometry::MultiPoint(_) => Self::MultiPoint,
            Geometry::MultiLineString(_) => Self::MultiLineString,
            Geometry::MultiPolygon(_) => Self::MultiPolygon,
            Geometry::GeometryCollection(_) => Self::GeometryCollection,
        }
    }

    /// Returns the multi-part member of this subtype's family.
    ///
    /// Subtypes without a multi-part counterpart are returned unchanged.
    #[must_use]
    pub fn to_multi(self) -> Self {
        match self {
            Self::Point => Self::MultiPoint,
            Self::LineString => Self::MultiLineString,
            Self::Polygon => Self::MultiPolygon,
            other => other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
            Self::Geometry => "Geometry",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry subtype and coordinate reference system of a geometry field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryDescriptor {
    pub geometry_type: GeometryType,
    /// Reference system identifier (`EPSG:4326`) or WKT, if known.
    pub crs: Option<String>,
}

/// Semantic type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Geometry(GeometryDescriptor),
    Text,
    Integer,
    Float,
    Date,
    Boolean,
    /// A type the model does not interpret, identified by its source type name.
    Opaque(String),
}

impl FieldKind {
    #[must_use]
    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }

    /// Returns the geometry descriptor for geometry fields.
    #[must_use]
    pub fn as_geometry(&self) -> Option<&GeometryDescriptor> {
        match self {
            Self::Geometry(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry(descriptor) => write!(f, "Geometry({})", descriptor.geometry_type),
            Self::Text => f.write_str("Text"),
            Self::Integer => f.write_str("Integer"),
            Self::Float => f.write_str("Float"),
            Self::Date => f.write_str("Date"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Opaque(name) => write!(f, "Opaque({name})"),
        }
    }
}

/// A named, typed attribute of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Maximum value length, meaningful for text fields.
    pub max_length: Option<usize>,
    pub nullable: bool,
    pub description: Option<String>,
}

impl Field {
    /// Creates a nullable field without length constraint or description.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            max_length: None,
            nullable: true,
            description: None,
        }
    }

    /// Creates a geometry field.
    pub fn geometry(
        name: impl Into<String>,
        geometry_type: GeometryType,
        crs: Option<String>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Geometry(GeometryDescriptor { geometry_type, crs }),
        )
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns a copy of this field under a different name; every other
    /// property is kept.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_geometry(&self) -> bool {
        self.kind.is_geometry()
    }
}

/// Ordered set of uniquely named fields shared by every record of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Builds a schema, rejecting duplicate field names.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if two fields share a name.
    pub fn try_new(type_name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        for (idx, field) in fields.iter().enumerate() {
            if fields[..idx].iter().any(|other| other.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self {
            type_name: type_name.into(),
            fields,
        })
    }

    /// Name of the feature type described by this schema.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn geometry_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_geometry())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{}:{}", field.name, field.kind))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} [{fields}]", self.type_name)
    }
}
