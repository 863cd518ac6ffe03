use super::{MapLayout, MapOptions, Placemark};
use crate::dataset::Snapshot;
use crate::error::Result;
use crate::pool::EntityPool;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";
const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Renders the pool as a KML 2.2 document.
pub fn to_kml(pool: &EntityPool, snapshot: &Snapshot, options: &MapOptions) -> Result<String> {
    let layout = MapLayout::build(pool, snapshot, options)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;
    for folder in &layout.folders {
        writer.write_event(Event::Start(
            BytesStart::new("Folder").with_attributes([("id", folder.id.as_str())]),
        ))?;
        write_text_element(&mut writer, "name", &folder.name)?;
        for placemark in &folder.placemarks {
            write_placemark(&mut writer, placemark)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Folder")))?;
    }
    for placemark in &layout.placemarks {
        write_placemark(&mut writer, placemark)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;

    let mut kml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    kml.push('\n');
    Ok(kml)
}

fn write_placemark<W: Write>(writer: &mut Writer<W>, placemark: &Placemark) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new("Placemark").with_attributes([("id", placemark.id.as_str())]),
    ))?;
    write_text_element(writer, "name", &placemark.name)?;
    writer.write_event(Event::Start(BytesStart::new("Point")))?;
    let coordinates = format!(
        "{},{}",
        placemark.location.long, placemark.location.lat
    );
    write_text_element(writer, "coordinates", &coordinates)?;
    writer.write_event(Event::End(BytesEnd::new("Point")))?;
    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
