//! KML placemark sink.

use std::path::Path;

use super::document::{cdata, xml_escape, DocumentWriter};
use super::traits::{RecordSink, SinkError};
use crate::record::{format_float, CanonicalRecord};

const KML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n<Document>\n";
const KML_FOOTER: &str = "</Document></kml>\n";

/// One `<Placemark>` per coordinate-bearing record. The full record rides
/// along as JSON in the description.
pub struct KmlSink {
    doc: DocumentWriter,
}

impl KmlSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self {
            doc: DocumentWriter::open(path, KML_HEADER, KML_FOOTER)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }
}

impl RecordSink for KmlSink {
    fn name(&self) -> &'static str {
        "kml"
    }

    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError> {
        let Some((lat, lon)) = record.position() else {
            return Ok(false);
        };

        let name = if record.full_cell_key.is_empty() {
            &record.device_id
        } else {
            &record.full_cell_key
        };
        let alt = record.alt_m.map(format_float).unwrap_or_else(|| "0".into());
        let placemark = format!(
            "<Placemark><name>{}</name><description>{}</description>\
             <Point><coordinates>{},{},{}</coordinates></Point></Placemark>\n",
            xml_escape(name),
            cdata(&record.to_json()?),
            format_float(lon),
            format_float(lat),
            alt
        );

        self.doc.append(&placemark)?;
        Ok(true)
    }

    fn finalize(&self) -> Result<(), SinkError> {
        self.doc.finalize()
    }
}
