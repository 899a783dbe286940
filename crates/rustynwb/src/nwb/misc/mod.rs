//! Miscellaneous series types.

use crate::error::Result;
use crate::io::{ArrayDataSetConfig, BaseDataType, DataValues};
use crate::nwb::base::{TimeSeries, TimeSeriesSettings};
use crate::nwb::{RegisteredType, TypeBase};

/// `core::AnnotationSeries`: timestamped text annotations.
///
/// The unit is fixed to `n/a` and the resolution to -1.
#[derive(Debug)]
pub struct AnnotationSeries {
    pub(crate) series: TimeSeries,
}

impl AnnotationSeries {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            series: TimeSeries::with_base(base),
        }
    }

    /// Create an empty, extendable annotation series with per-annotation
    /// timestamps. `chunking` applies to the annotation axis.
    pub fn initialize(&self, description: &str, comments: &str, chunking: usize) -> Result<()> {
        let config = ArrayDataSetConfig::new(BaseDataType::VarStr, vec![0], vec![chunking]);
        let settings = TimeSeriesSettings::new()
            .with_unit("n/a")
            .with_resolution(-1.0)
            .with_description(description)
            .with_comments(comments);
        self.series.initialize(config, &settings)
    }

    /// Append `num_samples` annotations at the end of the series.
    pub fn write_annotation(
        &self,
        num_samples: usize,
        data: &[String],
        timestamps: Option<&[f64]>,
        control: Option<&[u8]>,
    ) -> Result<()> {
        let start = self
            .base()
            .recording_data("data")?
            .shape()
            .first()
            .copied()
            .unwrap_or(0);
        self.series
            .write_data(&[num_samples], &[start], data, timestamps, control)
    }

    /// All annotations written so far.
    pub fn annotations(&self) -> Result<Vec<String>> {
        match self.data().values_generic()?.into_parts() {
            (DataValues::Str(values), _) => Ok(values),
            (other, _) => Err(crate::error::Error::TypeMismatch {
                expected: crate::io::ElementType::Str,
                actual: other.element_type(),
            }),
        }
    }
}

deref_to!(AnnotationSeries => TimeSeries, series);
impl_registered_type!(
    AnnotationSeries,
    "core",
    "AnnotationSeries",
    base = series.interface.nwb_container.container.base
);
