//! Stream readers
//!
//! One [`contracts::StreamReader`] per non-Harp stream kind, plus the
//! mapping from a manifest [`StreamSpec`] to a boxed reader.

mod camera;
mod delimited;
mod json;
mod text;

pub use camera::CameraReader;
pub use delimited::{parse_cell, CsvReader};
pub use json::{json_to_value, JsonReader, TIMESTAMP_COLUMN};
pub use text::{TextReader, CONTENT_COLUMN};

use contracts::{StreamReader, StreamSpec};

/// Build the reader described by `spec`
pub fn reader_for(spec: &StreamSpec) -> Box<dyn StreamReader> {
    match spec {
        StreamSpec::Csv {
            delimiter,
            has_header,
            index,
        } => Box::new(CsvReader::new(*delimiter, *has_header, index.clone())),
        StreamSpec::Json { layout } => Box::new(JsonReader::new(*layout)),
        StreamSpec::Text => Box::new(TextReader),
        StreamSpec::Camera {
            metadata,
            video_extensions,
        } => Box::new(CameraReader::new(metadata.clone(), video_extensions.clone())),
    }
}

#[cfg(test)]
mod tests {
    use contracts::{JsonLayout, StreamKind};

    use super::*;

    #[test]
    fn test_reader_kind_follows_spec() {
        assert_eq!(reader_for(&StreamSpec::csv()).kind(), StreamKind::Csv);
        assert_eq!(
            reader_for(&StreamSpec::Json {
                layout: JsonLayout::Lines
            })
            .kind(),
            StreamKind::Json
        );
        assert_eq!(reader_for(&StreamSpec::Text).kind(), StreamKind::Text);
        assert_eq!(reader_for(&StreamSpec::camera()).kind(), StreamKind::Camera);
    }
}
