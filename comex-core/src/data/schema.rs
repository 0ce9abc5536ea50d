use crate::domain::{Dimension, FlowDirection};
use polars::prelude::*;

pub const DATE: &str = "DATE";
pub const COMMODITY_CODE: &str = "COMMODITY_CODE";

pub const ARTIFACT_DATE: &str = "<DATA>";
pub const ARTIFACT_CODE: &str = "<COD>";

/// Expected schema for processed record tables
pub struct RecordSchema;

impl RecordSchema {
    /// Text key columns, in table order.
    pub fn key_columns() -> [&'static str; 5] {
        [
            DATE,
            COMMODITY_CODE,
            Dimension::State.key_column(),
            Dimension::Country.key_column(),
            Dimension::Harbor.key_column(),
        ]
    }

    /// Get the processed record schema for a flow direction
    pub fn schema(flow: FlowDirection) -> Schema {
        let keys = Self::key_columns()
            .into_iter()
            .map(|name| Field::new(name.into(), DataType::String));
        let measures = flow
            .measures()
            .iter()
            .map(|m| Field::new(m.record_column().into(), DataType::Float64));
        Schema::from_iter(keys.chain(measures))
    }

    /// Columns aggregation cannot do without.
    pub fn required_columns(flow: FlowDirection) -> Vec<&'static str> {
        let mut cols = vec![DATE, COMMODITY_CODE];
        cols.extend(flow.measures().iter().map(|m| m.record_column()));
        cols
    }
}

/// Column layout of an `.ipv` artifact for one flow direction.
///
/// `<DATA>,<KGL>,<FOB>[,<VLF>,<VLS>],<COD>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub flow: FlowDirection,
}

impl ArtifactLayout {
    pub fn new(flow: FlowDirection) -> Self {
        Self { flow }
    }

    /// Column names in canonical order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut cols = vec![ARTIFACT_DATE];
        cols.extend(self.flow.measures().iter().map(|m| m.artifact_column()));
        cols.push(ARTIFACT_CODE);
        cols
    }

    pub fn schema(&self) -> Schema {
        Schema::from_iter(self.columns().into_iter().map(|name| {
            let dtype = if name == ARTIFACT_DATE || name == ARTIFACT_CODE {
                DataType::String
            } else {
                DataType::Float64
            };
            Field::new(name.into(), dtype)
        }))
    }

    /// Pick the layout from a header: freight and insurance columns mean imports.
    pub fn detect<S: AsRef<str>>(header: &[S]) -> Self {
        let has = |wanted: &str| header.iter().any(|h| h.as_ref() == wanted);
        let import_only = &FlowDirection::Import.measures()[FlowDirection::Export.measures().len()..];
        if import_only.iter().all(|m| has(m.artifact_column())) {
            Self::new(FlowDirection::Import)
        } else {
            Self::new(FlowDirection::Export)
        }
    }

    /// Check a header against the layout: every expected column present, nothing extra.
    pub fn check_header<S: AsRef<str>>(&self, header: &[S]) -> Result<(), SchemaError> {
        let expected = self.columns();
        for column in &expected {
            if !header.iter().any(|h| h.as_ref() == *column) {
                return Err(SchemaError::MissingColumn(column.to_string()));
            }
        }
        if let Some(extra) = header.iter().find(|h| !expected.contains(&h.as_ref())) {
            return Err(SchemaError::UnexpectedColumn(extra.as_ref().to_string()));
        }
        Ok(())
    }

    /// Validate DataFrame against the layout, including column order and types
    pub fn validate(&self, df: &DataFrame) -> Result<(), SchemaError> {
        let expected = self.schema();
        let actual = df.schema();

        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        self.check_header(&names)?;
        if names != self.columns() {
            return Err(SchemaError::ColumnOrder(names.join(",")));
        }

        for field in expected.iter_fields() {
            let actual_dtype = actual.get(field.name()).ok_or_else(|| {
                SchemaError::MissingColumn(field.name().to_string())
            })?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unexpected column: {0}")]
    UnexpectedColumn(String),

    #[error("Columns out of canonical order: {0}")]
    ColumnOrder(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_layout_has_four_columns() {
        let layout = ArtifactLayout::new(FlowDirection::Export);
        assert_eq!(layout.columns(), vec!["<DATA>", "<KGL>", "<FOB>", "<COD>"]);
    }

    #[test]
    fn test_import_layout_has_six_columns() {
        let layout = ArtifactLayout::new(FlowDirection::Import);
        assert_eq!(
            layout.columns(),
            vec!["<DATA>", "<KGL>", "<FOB>", "<VLF>", "<VLS>", "<COD>"]
        );
    }

    #[test]
    fn test_record_schema_types() {
        let schema = RecordSchema::schema(FlowDirection::Import);
        assert_eq!(schema.get("PORT_CODE"), Some(&DataType::String));
        assert_eq!(schema.get("INSURANCE_VALUE"), Some(&DataType::Float64));
        assert!(!RecordSchema::schema(FlowDirection::Export).contains("FREIGHT_VALUE"));
    }

    #[test]
    fn test_detect_layout_from_header() {
        let im = ["<DATA>", "<KGL>", "<FOB>", "<VLF>", "<VLS>", "<COD>"];
        let ex = ["<DATA>", "<KGL>", "<FOB>", "<COD>"];
        assert_eq!(ArtifactLayout::detect(&im).flow, FlowDirection::Import);
        assert_eq!(ArtifactLayout::detect(&ex).flow, FlowDirection::Export);
    }

    #[test]
    fn test_check_header_rejects_missing_and_extra() {
        let layout = ArtifactLayout::new(FlowDirection::Export);
        let missing = ["<DATA>", "<KGL>", "<COD>"];
        assert!(matches!(
            layout.check_header(&missing),
            Err(SchemaError::MissingColumn(c)) if c == "<FOB>"
        ));
        let extra = ["<DATA>", "<KGL>", "<FOB>", "<VLF>", "<COD>"];
        assert!(matches!(
            layout.check_header(&extra),
            Err(SchemaError::UnexpectedColumn(c)) if c == "<VLF>"
        ));
    }

    #[test]
    fn test_validate_accepts_empty_frame_with_schema() {
        let layout = ArtifactLayout::new(FlowDirection::Import);
        let df = DataFrame::empty_with_schema(&layout.schema());
        assert!(layout.validate(&df).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let layout = ArtifactLayout::new(FlowDirection::Export);
        let df = DataFrame::new(vec![
            Series::new("<DATA>".into(), &["2024-01-01"]).into(),
            Series::new("<KGL>".into(), &["heavy"]).into(),
            Series::new("<FOB>".into(), &[1.0]).into(),
            Series::new("<COD>".into(), &["COMEX:001_EX_US_BR"]).into(),
        ])
        .unwrap();
        assert!(matches!(
            layout.validate(&df),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }
}
