//! GPX track-log sink.

use std::path::Path;

use super::document::DocumentWriter;
use super::traits::{RecordSink, SinkError};
use crate::record::{format_float, CanonicalRecord};

const GPX_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<gpx version=\"1.1\" creator=\"collector\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n\
<trk><name>cellstream</name><trkseg>\n";
const GPX_FOOTER: &str = "</trkseg></trk></gpx>\n";

/// One `<trkpt>` per coordinate-bearing record, in a single track segment.
pub struct GpxSink {
    doc: DocumentWriter,
}

impl GpxSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self {
            doc: DocumentWriter::open(path, GPX_HEADER, GPX_FOOTER)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }
}

impl RecordSink for GpxSink {
    fn name(&self) -> &'static str {
        "gpx"
    }

    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError> {
        let Some((lat, lon)) = record.position() else {
            return Ok(false);
        };

        let ele = record.alt_m.map(format_float).unwrap_or_else(|| "0".into());
        self.doc.append(&format!(
            "<trkpt lat=\"{}\" lon=\"{}\"><ele>{}</ele></trkpt>\n",
            format_float(lat),
            format_float(lon),
            ele
        ))?;
        Ok(true)
    }

    fn finalize(&self) -> Result<(), SinkError> {
        self.doc.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;
    use tempfile::tempdir;

    #[test]
    fn test_track_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.gpx");
        let sink = GpxSink::open(&path).unwrap();

        sink.write(&sample_record(Some(45.5), Some(-122.25))).unwrap();
        sink.write(&sample_record(None, None)).unwrap();
        let mut low = sample_record(Some(-33.0), Some(151.0));
        low.alt_m = None;
        sink.write(&low).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        let expected = format!(
            "{}{}{}{}",
            GPX_HEADER,
            "<trkpt lat=\"45.5\" lon=\"-122.25\"><ele>12.0</ele></trkpt>\n",
            "<trkpt lat=\"-33.0\" lon=\"151.0\"><ele>0</ele></trkpt>\n",
            GPX_FOOTER
        );
        assert_eq!(content, expected);
    }
}
