//! Schema normalization for shapefile export.
//!
//! A shapefile stores exactly one geometry column, always first and always
//! under a fixed name, restricted to a handful of geometry subtypes. The
//! [`SchemaNormalizer`] turns an arbitrary input schema into that layout and
//! re-expresses every record under it:
//!
//! ```
//! use geoshp_core::normalize::SchemaNormalizer;
//! use geoshp_core_common::{Field, GeometryType, Schema};
//!
//! let input = Schema::try_new(
//!     "parcels",
//!     vec![
//!         Field::text("owner"),
//!         Field::geometry("geom", GeometryType::MultiPolygon, None),
//!     ],
//! )
//! .unwrap();
//!
//! let (output, rename) = SchemaNormalizer::shapefile()
//!     .derive_output_schema(&input)
//!     .unwrap();
//! assert_eq!(output.fields()[0].name, "the_geom");
//! assert_eq!(output.fields()[1].name, "owner");
//! assert_eq!(rename.original, "geom");
//! ```
//!
//! Derivation is all-or-nothing and happens before any record is touched.
//! Records are then normalized one at a time, either individually with
//! [`normalize_record`] or lazily through [`SchemaNormalizer::normalize_stream`].

use std::collections::BTreeMap;
use std::iter::FusedIterator;

use geoshp_core_common::{GeometryType, Record, RecordRef, Schema, SchemaError, Value};
use log::debug;

/// Structural constraints of an output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFormat {
    canonical_geometry_name: String,
    supported_geometry_types: Vec<GeometryType>,
}

impl TargetFormat {
    #[must_use]
    pub fn new(
        canonical_geometry_name: impl Into<String>,
        supported_geometry_types: impl IntoIterator<Item = GeometryType>,
    ) -> Self {
        Self {
            canonical_geometry_name: canonical_geometry_name.into(),
            supported_geometry_types: supported_geometry_types.into_iter().collect(),
        }
    }

    /// ESRI Shapefile: `the_geom`, holding points or one of the multi geometries.
    #[must_use]
    pub fn shapefile() -> Self {
        Self::new("the_geom", geoshp_shapefile::SUPPORTED_GEOMETRY_TYPES)
    }

    #[must_use]
    pub fn canonical_geometry_name(&self) -> &str {
        &self.canonical_geometry_name
    }

    #[must_use]
    pub fn supported_geometry_types(&self) -> &[GeometryType] {
        &self.supported_geometry_types
    }

    #[must_use]
    pub fn supports(&self, geometry_type: GeometryType) -> bool {
        self.supported_geometry_types.contains(&geometry_type)
    }
}

/// Maps the input geometry field name to the canonical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRename {
    /// Name of the geometry field in the input schema and its records
    pub original: String,
    /// Name of the geometry field in the output schema
    pub canonical: String,
}

impl GeometryRename {
    /// Name to look up in a source record for the output field `name`.
    fn source_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name == self.canonical {
            &self.original
        } else {
            name
        }
    }
}

/// Derives target-format schemas and normalizes records under them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNormalizer {
    target: TargetFormat,
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::shapefile()
    }
}

impl SchemaNormalizer {
    #[must_use]
    pub fn new(target: TargetFormat) -> Self {
        Self { target }
    }

    #[must_use]
    pub fn shapefile() -> Self {
        Self::new(TargetFormat::shapefile())
    }

    /// Uses `name` instead of the target format's canonical geometry name.
    #[must_use]
    pub fn with_canonical_geometry_name(mut self, name: impl Into<String>) -> Self {
        self.target.canonical_geometry_name = name.into();
        self
    }

    #[must_use]
    pub fn target(&self) -> &TargetFormat {
        &self.target
    }

    /// Builds the output schema: the geometry field first under the canonical
    /// name, followed by every other field in its original relative order.
    ///
    /// The geometry field keeps its subtype, CRS, nullability and description.
    /// Deriving from an already normalized schema returns it unchanged.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`SchemaError::NoGeometryField`] when `input` has no geometry field
    /// - [`SchemaError::MultipleGeometryFields`] when it has more than one
    /// - [`SchemaError::UnsupportedGeometrySubtype`] when the target format
    ///   cannot store the geometry subtype
    /// - [`SchemaError::DuplicateField`] when another field already uses the
    ///   canonical geometry name
    pub fn derive_output_schema(
        &self,
        input: &Schema,
    ) -> Result<(Schema, GeometryRename), SchemaError> {
        let geometry_fields: Vec<_> = input.geometry_fields().collect();
        let geometry = match geometry_fields.as_slice() {
            [] => return Err(SchemaError::NoGeometryField),
            [geometry] => *geometry,
            many => {
                return Err(SchemaError::MultipleGeometryFields {
                    fields: many.iter().map(|field| field.name.clone()).collect(),
                });
            },
        };

        if let Some(descriptor) = geometry.kind.as_geometry() {
            if !self.target.supports(descriptor.geometry_type) {
                return Err(SchemaError::UnsupportedGeometrySubtype {
                    field: geometry.name.clone(),
                    geometry_type: descriptor.geometry_type,
                });
            }
        }

        let canonical = self.target.canonical_geometry_name();
        let mut fields = Vec::with_capacity(input.len());
        fields.push(geometry.renamed(canonical));
        for field in input.fields().iter().filter(|field| !field.is_geometry()) {
            if field.name == canonical {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
            fields.push(field.clone());
        }

        let output = Schema::try_new(input.type_name(), fields)?;
        let rename = GeometryRename {
            original: geometry.name.clone(),
            canonical: canonical.to_string(),
        };
        debug!(
            "Normalized schema {input} to {output} (geometry '{}' -> '{}')",
            rename.original, rename.canonical
        );
        Ok((output, rename))
    }

    /// Derives the output schema once, then normalizes `records` lazily.
    ///
    /// The returned iterator pulls one source record per output record, keeps
    /// the input order, and stops after the first error. Source errors are
    /// passed through unchanged; normalization failures are converted with
    /// `E::from`. Dropping the iterator early is a valid way to cancel.
    ///
    /// # Errors
    ///
    /// Returns the schema derivation error before any record is read.
    pub fn normalize_stream<I, E>(
        &self,
        input: &Schema,
        records: I,
    ) -> Result<(Schema, NormalizedRecords<I::IntoIter>), SchemaError>
    where
        I: IntoIterator<Item = Result<Record, E>>,
        E: From<SchemaError>,
    {
        let (output, rename) = self.derive_output_schema(input)?;
        let plan = RecordPlan::new(&output, &rename);
        Ok((
            output,
            NormalizedRecords {
                plan,
                source: records.into_iter(),
                position: 0,
                finished: false,
            },
        ))
    }
}

/// Re-expresses `record` under `output`, a schema derived with `rename`.
///
/// The source record is left untouched. Values absent from nullable fields
/// become [`Value::Null`]; source values with no field in `output` are not
/// carried over.
///
/// # Errors
///
/// Returns [`SchemaError::MissingValue`] naming the field looked up in
/// `record` when a non-nullable field has no value (or an explicit null).
/// Records without an identifier are reported as position 0.
pub fn normalize_record(
    output: &Schema,
    rename: &GeometryRename,
    record: &Record,
) -> Result<Record, SchemaError> {
    RecordPlan::new(output, rename).apply(record.clone(), 0)
}

/// Per-field lookup instructions, computed once per run.
#[derive(Debug, Clone)]
struct RecordPlan {
    steps: Vec<PlanStep>,
}

#[derive(Debug, Clone)]
struct PlanStep {
    source: String,
    target: String,
    nullable: bool,
}

impl RecordPlan {
    fn new(output: &Schema, rename: &GeometryRename) -> Self {
        let steps = output
            .fields()
            .iter()
            .map(|field| PlanStep {
                source: rename.source_name(&field.name).to_string(),
                target: field.name.clone(),
                nullable: field.nullable,
            })
            .collect();
        Self { steps }
    }

    fn apply(&self, record: Record, position: usize) -> Result<Record, SchemaError> {
        let (id, mut values) = record.into_parts();
        let mut normalized = BTreeMap::new();
        for step in &self.steps {
            let value = match values.remove(&step.source) {
                Some(value) if !value.is_null() => value,
                _ if step.nullable => Value::Null,
                _ => {
                    return Err(SchemaError::MissingValue {
                        field: step.source.clone(),
                        record: RecordRef::for_record(id.as_deref(), position),
                    });
                },
            };
            normalized.insert(step.target.clone(), value);
        }
        Ok(Record::from_parts(id, normalized))
    }
}

/// Lazily normalized records, produced by [`SchemaNormalizer::normalize_stream`].
#[derive(Debug)]
pub struct NormalizedRecords<I> {
    plan: RecordPlan,
    source: I,
    position: usize,
    finished: bool,
}

impl<I> NormalizedRecords<I> {
    /// Number of source records pulled so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.position
    }
}

impl<I, E> Iterator for NormalizedRecords<I>
where
    I: Iterator<Item = Result<Record, E>>,
    E: From<SchemaError>,
{
    type Item = Result<Record, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(next) = self.source.next() else {
            self.finished = true;
            return None;
        };
        let position = self.position;
        self.position += 1;

        let result = next.and_then(|record| self.plan.apply(record, position).map_err(E::from));
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.source.size_hint().1)
        }
    }
}

impl<I, E> FusedIterator for NormalizedRecords<I>
where
    I: Iterator<Item = Result<Record, E>>,
    E: From<SchemaError>,
{
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use geo_types::{Geometry, MultiPolygon, point, polygon};
    use geoshp_core_common::{Field, FieldKind, GeometryDescriptor};

    use super::*;

    fn names(schema: &Schema) -> Vec<&str> {
        schema.fields().iter().map(|f| f.name.as_str()).collect()
    }

    fn parcel() -> Geometry<f64> {
        Geometry::MultiPolygon(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]]))
    }

    fn places_schema() -> Schema {
        Schema::try_new(
            "places",
            vec![
                Field::text("name"),
                Field::geometry("location", GeometryType::Point, Some("EPSG:4326".into()))
                    .with_nullable(false)
                    .with_description("Site centroid"),
                Field::integer("count"),
            ],
        )
        .unwrap()
    }

    fn place(name: &str, count: i64) -> Record {
        Record::new()
            .with_value("name", name)
            .with_value("location", Geometry::Point(point!(x: 1.0, y: 2.0)))
            .with_value("count", count)
    }

    #[test]
    fn geometry_moves_first_even_when_already_canonical() {
        let input = Schema::try_new(
            "t",
            vec![
                Field::text("name"),
                Field::geometry("the_geom", GeometryType::Point, None),
                Field::integer("count"),
            ],
        )
        .unwrap();

        let (output, rename) = SchemaNormalizer::shapefile()
            .derive_output_schema(&input)
            .unwrap();

        assert_eq!(names(&output), vec!["the_geom", "name", "count"]);
        assert_eq!(rename.original, "the_geom");
        assert_eq!(output.field("name").unwrap().kind, FieldKind::Text);
        assert_eq!(output.field("count").unwrap().kind, FieldKind::Integer);
    }

    #[test]
    fn geometry_is_renamed_and_records_follow() {
        let input = Schema::try_new(
            "parcels",
            vec![
                Field::geometry("geom", GeometryType::MultiPolygon, None),
                Field::integer("id"),
            ],
        )
        .unwrap();

        let (output, rename) = SchemaNormalizer::shapefile()
            .derive_output_schema(&input)
            .unwrap();
        assert_eq!(names(&output), vec!["the_geom", "id"]);
        assert_eq!(
            output.fields()[0].kind,
            FieldKind::Geometry(GeometryDescriptor {
                geometry_type: GeometryType::MultiPolygon,
                crs: None,
            })
        );

        let record = Record::new().with_value("geom", parcel()).with_value("id", 5_i64);
        let normalized = normalize_record(&output, &rename, &record).unwrap();

        assert_eq!(normalized.get("the_geom"), Some(&Value::Geometry(parcel())));
        assert_eq!(normalized.get("id"), Some(&Value::Integer(5)));
        assert_eq!(normalized.len(), 2);
        // The source record is not modified.
        assert_eq!(record.get("geom"), Some(&Value::Geometry(parcel())));
    }

    #[test]
    fn geometry_properties_survive_the_rename() {
        let (output, _) = SchemaNormalizer::shapefile()
            .derive_output_schema(&places_schema())
            .unwrap();

        let geometry = &output.fields()[0];
        let original = places_schema().field("location").unwrap().clone();
        assert_eq!(geometry, &original.renamed("the_geom"));
        assert!(!geometry.nullable);
        assert_eq!(geometry.description.as_deref(), Some("Site centroid"));
        assert_eq!(output.type_name(), "places");
        assert_eq!(output.len(), places_schema().len());
    }

    #[test]
    fn schema_without_geometry_is_rejected() {
        let input = Schema::try_new("t", vec![Field::text("a"), Field::text("b")]).unwrap();
        let err = SchemaNormalizer::shapefile()
            .derive_output_schema(&input)
            .unwrap_err();
        assert_eq!(err, SchemaError::NoGeometryField);
    }

    #[test]
    fn schema_with_two_geometries_is_rejected() {
        let input = Schema::try_new(
            "t",
            vec![
                Field::geometry("a", GeometryType::Point, None),
                Field::text("name"),
                Field::geometry("b", GeometryType::Point, None),
            ],
        )
        .unwrap();
        let err = SchemaNormalizer::shapefile()
            .derive_output_schema(&input)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MultipleGeometryFields {
                fields: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn unsupported_subtypes_are_rejected() {
        for geometry_type in [
            GeometryType::LineString,
            GeometryType::Polygon,
            GeometryType::GeometryCollection,
            GeometryType::Geometry,
        ] {
            let input = Schema::try_new(
                "t",
                vec![Field::geometry("shape", geometry_type, None)],
            )
            .unwrap();
            let err = SchemaNormalizer::shapefile()
                .derive_output_schema(&input)
                .unwrap_err();
            assert_eq!(
                err,
                SchemaError::UnsupportedGeometrySubtype {
                    field: "shape".into(),
                    geometry_type,
                }
            );
        }
    }

    #[test]
    fn attribute_using_canonical_name_is_rejected() {
        let input = Schema::try_new(
            "t",
            vec![
                Field::geometry("geom", GeometryType::Point, None),
                Field::text("the_geom"),
            ],
        )
        .unwrap();
        let err = SchemaNormalizer::shapefile()
            .derive_output_schema(&input)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                name: "the_geom".into()
            }
        );
    }

    #[test]
    fn derivation_is_idempotent() {
        let normalizer = SchemaNormalizer::shapefile();
        let (once, _) = normalizer.derive_output_schema(&places_schema()).unwrap();
        let (twice, rename) = normalizer.derive_output_schema(&once).unwrap();

        assert_eq!(once, twice);
        assert_eq!(rename.original, rename.canonical);
    }

    #[test]
    fn canonical_name_is_configurable() {
        let normalizer = SchemaNormalizer::shapefile().with_canonical_geometry_name("SHAPE");
        let (output, _) = normalizer.derive_output_schema(&places_schema()).unwrap();
        assert_eq!(names(&output), vec!["SHAPE", "name", "count"]);
    }

    #[test]
    fn missing_required_value_names_source_field() {
        let (output, rename) = SchemaNormalizer::shapefile()
            .derive_output_schema(&places_schema())
            .unwrap();
        let record = Record::new().with_id("p-7").with_value("name", "Depot");

        let err = normalize_record(&output, &rename, &record).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingValue {
                field: "location".into(),
                record: RecordRef::Id("p-7".into()),
            }
        );
    }

    #[test]
    fn explicit_null_in_required_field_is_missing() {
        let (output, rename) = SchemaNormalizer::shapefile()
            .derive_output_schema(&places_schema())
            .unwrap();
        let record = place("Depot", 1).with_value("location", Value::Null);

        let err = normalize_record(&output, &rename, &record).unwrap_err();
        assert!(matches!(err, SchemaError::MissingValue { ref field, .. } if field == "location"));
    }

    #[test]
    fn absent_nullable_values_become_null() {
        let (output, rename) = SchemaNormalizer::shapefile()
            .derive_output_schema(&places_schema())
            .unwrap();
        let record = Record::new()
            .with_value("location", Geometry::Point(point!(x: 0.0, y: 0.0)))
            .with_value("unknown", "dropped");

        let normalized = normalize_record(&output, &rename, &record).unwrap();
        assert_eq!(normalized.get("name"), Some(&Value::Null));
        assert_eq!(normalized.get("count"), Some(&Value::Null));
        assert!(normalized.get("unknown").is_none());
        assert_eq!(normalized.len(), output.len());
    }

    #[test]
    fn stream_preserves_order_and_ids() {
        let records = vec![
            place("a", 1).with_id("first"),
            place("b", 2),
            place("c", 3),
        ];
        let (output, stream) = SchemaNormalizer::shapefile()
            .normalize_stream(&places_schema(), records.into_iter().map(Ok::<_, SchemaError>))
            .unwrap();
        assert_eq!(names(&output), vec!["the_geom", "name", "count"]);

        let normalized: Vec<Record> = stream.collect::<Result<_, _>>().unwrap();
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].id(), Some("first"));
        let counts: Vec<_> = normalized.iter().map(|r| r.get("count").cloned()).collect();
        assert_eq!(
            counts,
            vec![
                Some(Value::Integer(1)),
                Some(Value::Integer(2)),
                Some(Value::Integer(3)),
            ]
        );
    }

    #[test]
    fn stream_stops_at_first_failure_with_position() {
        let records = vec![
            place("a", 1),
            place("b", 2),
            Record::new().with_value("name", "broken"),
            place("d", 4),
        ];
        let (_, mut stream) = SchemaNormalizer::shapefile()
            .normalize_stream(&places_schema(), records.into_iter().map(Ok::<_, SchemaError>))
            .unwrap();

        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_ok());
        assert_eq!(
            stream.next().unwrap().unwrap_err(),
            SchemaError::MissingValue {
                field: "location".into(),
                record: RecordRef::Position(2),
            }
        );
        assert!(stream.next().is_none());
        assert_eq!(stream.records_read(), 3);
    }

    #[test]
    fn stream_forwards_source_errors_once() {
        #[derive(Debug, PartialEq)]
        enum ReadError {
            Io,
            Schema(SchemaError),
        }
        impl From<SchemaError> for ReadError {
            fn from(err: SchemaError) -> Self {
                Self::Schema(err)
            }
        }

        let records = vec![Ok(place("a", 1)), Err(ReadError::Io), Ok(place("c", 3))];
        let (_, stream) = SchemaNormalizer::shapefile()
            .normalize_stream(&places_schema(), records)
            .unwrap();

        let results: Vec<_> = stream.collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Err(ReadError::Io));
    }

    #[test]
    fn stream_pulls_lazily() {
        let pulled = Cell::new(0);
        let source = (0..1000).map(|i| {
            pulled.set(pulled.get() + 1);
            Ok::<_, SchemaError>(place("x", i))
        });

        let (_, mut stream) = SchemaNormalizer::shapefile()
            .normalize_stream(&places_schema(), source)
            .unwrap();
        assert_eq!(pulled.get(), 0);

        stream.next();
        stream.next();
        assert_eq!(pulled.get(), 2);
        drop(stream);
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn stream_derivation_failure_reads_nothing() {
        let pulled = Cell::new(0);
        let source = std::iter::from_fn(|| {
            pulled.set(pulled.get() + 1);
            Some(Ok::<_, SchemaError>(Record::new()))
        });
        let input = Schema::try_new("t", vec![Field::text("a")]).unwrap();

        let err = SchemaNormalizer::shapefile()
            .normalize_stream(&input, source)
            .unwrap_err();
        assert_eq!(err, SchemaError::NoGeometryField);
        assert_eq!(pulled.get(), 0);
    }
}
