use crate::error::{OxPointsError, Result};
use quick_xml::escape::escape;

/// Renders a list of names. Returns the content type with the body.
pub fn to_name_list(names: &[&str], format: &str) -> Result<(&'static str, String)> {
    let rendered = match format {
        "txt" => ("text/plain", format!("{}\n", names.join("|"))),
        "csv" => ("text/csv", format!("{}\n", names.join(","))),
        "js" => {
            let quoted = names
                .iter()
                .map(|n| format!("'{}'", n.replace('\\', "\\\\").replace('\'', "\\'")))
                .collect::<Vec<_>>();
            (
                "text/javascript",
                format!("var oxpointsTypes = [{}];\n", quoted.join(",")),
            )
        }
        "xml" => {
            let items = names
                .iter()
                .map(|n| format!("<i>{}</i>", escape(*n)))
                .collect::<String>();
            ("text/xml", format!("<c>{items}</c>\n"))
        }
        other => {
            return Err(OxPointsError::bad_request(format!(
                "Unexpected format {other}"
            )))
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 3] = ["Building", "College", "Room"];

    #[test]
    fn every_list_format() {
        assert_eq!(
            to_name_list(&NAMES, "txt").unwrap(),
            ("text/plain", "Building|College|Room\n".to_owned())
        );
        assert_eq!(
            to_name_list(&NAMES, "csv").unwrap().1,
            "Building,College,Room\n"
        );
        assert_eq!(
            to_name_list(&NAMES, "js").unwrap().1,
            "var oxpointsTypes = ['Building','College','Room'];\n"
        );
        assert_eq!(
            to_name_list(&NAMES, "xml").unwrap().1,
            "<c><i>Building</i><i>College</i><i>Room</i></c>\n"
        );
    }

    #[test]
    fn unknown_list_format() {
        let error = to_name_list(&NAMES, "kml").unwrap_err();
        assert_eq!(error.to_string(), "Unexpected format kml");
        assert_eq!(error.status(), 400);
    }
}
