//! Content-negotiated body decoding.
//!
//! One decoder per declared content type, all producing the same structured
//! shape: an ordered field map plus any uploaded file parts. A typed target
//! deserializes from that shape through serde, which is where per-format
//! field-name aliases come in — `#[serde(alias = "...")]` accepts a key under
//! one name in JSON and another in a form or XML body, landing both in the
//! same field.
//!
//! ```rust
//! use serde::Deserialize;
//! use twine::Request;
//!
//! #[derive(Deserialize)]
//! struct Login {
//!     #[serde(alias = "user")]
//!     username: String,
//!     password: String,
//! }
//!
//! # async fn handler(req: Request) -> Result<(), twine::Error> {
//! let login: Login = req.parse().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The parsing itself is delegated: serde_json for JSON, serde_urlencoded
//! for forms, quick-xml for XML tokenizing, multer for multipart framing.

use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;

/// A decoded request body: fields by name, files by field name.
///
/// Field order is deterministic (sorted by name), so iterating the map is an
/// observable, testable property. Form, XML, and multipart fields are
/// strings; JSON fields keep their native scalar types.
#[derive(Debug)]
pub struct DecodedBody {
    media_type: String,
    fields: Map<String, Value>,
    files: Vec<FilePart>,
}

/// One uploaded file from a `multipart/form-data` body.
#[derive(Debug)]
pub struct FilePart {
    /// The form field name the part was sent under.
    pub name: String,
    /// The client-supplied filename.
    pub filename: String,
    /// The raw part bytes, exactly as sent.
    pub bytes: Bytes,
}

impl DecodedBody {
    /// Selects a decoder by the declared content type and runs it.
    pub(crate) async fn decode(content_type: Option<&str>, body: &Bytes) -> Result<Self, Error> {
        let declared = content_type.unwrap_or_default();
        let media_type = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/json" => Self::json(media_type, body),
            "application/x-www-form-urlencoded" => Self::form(media_type, body),
            "multipart/form-data" => Self::multipart(media_type, declared, body).await,
            "application/xml" | "text/xml" => Self::xml(media_type, body),
            "" => Err(Error::decode("<none>", "missing content-type header")),
            _ => Err(Error::decode(media_type, "no decoder for this content type")),
        }
    }

    /// Returns a field's text content. `None` for absent or non-string fields.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns a field as decoded, JSON scalar types preserved.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the first file part sent under `name`.
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// Deserializes the field map into `T`, honoring serde field aliases.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.fields))
            .map_err(|e| Error::decode(self.media_type, e))
    }

    // ── Decoders ──────────────────────────────────────────────────────────────

    fn json(media_type: String, body: &[u8]) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| Error::decode(&media_type, e))?;
        match value {
            Value::Object(fields) => Ok(Self { media_type, fields, files: Vec::new() }),
            _ => Err(Error::decode(media_type, "expected a JSON object")),
        }
    }

    fn form(media_type: String, body: &[u8]) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(|e| Error::decode(&media_type, e))?;
        let fields = pairs
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        Ok(Self { media_type, fields, files: Vec::new() })
    }

    /// Maps the text content of the root's direct child elements by tag name.
    /// Deeper nesting is ignored — the decoded shape is flat by contract.
    fn xml(media_type: String, body: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(body).map_err(|e| Error::decode(&media_type, e))?;
        let mut reader = Reader::from_str(text);

        let mut fields = Map::new();
        let mut depth = 0usize;
        let mut current: Option<String> = None;
        loop {
            match reader.read_event().map_err(|e| Error::decode(&media_type, e))? {
                Event::Start(e) => {
                    depth += 1;
                    if depth == 2 {
                        current =
                            Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    }
                }
                Event::Text(t) => {
                    if depth == 2 {
                        let value = t.unescape().map_err(|e| Error::decode(&media_type, e))?;
                        let value = value.trim();
                        if let Some(tag) = &current {
                            if !value.is_empty() {
                                fields.insert(tag.clone(), Value::String(value.to_owned()));
                            }
                        }
                    }
                }
                Event::End(_) => {
                    if depth == 2 {
                        current = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Self { media_type, fields, files: Vec::new() })
    }

    async fn multipart(media_type: String, declared: &str, body: &Bytes) -> Result<Self, Error> {
        let boundary =
            multer::parse_boundary(declared).map_err(|e| Error::decode(&media_type, e))?;

        // The body is already in memory; multer just wants it as a stream.
        let chunk = body.clone();
        let stream = futures_util::stream::once(async move {
            Ok::<Bytes, std::convert::Infallible>(chunk)
        });
        let mut parts = multer::Multipart::new(stream, boundary);

        let mut fields = Map::new();
        let mut files = Vec::new();
        while let Some(part) = parts
            .next_field()
            .await
            .map_err(|e| Error::decode(&media_type, e))?
        {
            let name = part.name().unwrap_or_default().to_owned();
            match part.file_name().map(str::to_owned) {
                Some(filename) => {
                    let bytes =
                        part.bytes().await.map_err(|e| Error::decode(&media_type, e))?;
                    files.push(FilePart { name, filename, bytes });
                }
                None => {
                    let value =
                        part.text().await.map_err(|e| Error::decode(&media_type, e))?;
                    fields.insert(name, Value::String(value));
                }
            }
        }
        Ok(Self { media_type, fields, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Register {
        #[serde(alias = "userName", alias = "user-name")]
        username: String,
        password: String,
        name: String,
    }

    async fn decode(content_type: &str, body: &[u8]) -> Result<DecodedBody, Error> {
        DecodedBody::decode(Some(content_type), &Bytes::copy_from_slice(body)).await
    }

    #[tokio::test]
    async fn json_form_and_xml_share_one_shape() {
        let json = decode(
            "application/json",
            br#"{"username":"Roni","password":"rahasia","name":"Roni Purwanto"}"#,
        )
        .await
        .unwrap();
        let form = decode(
            "application/x-www-form-urlencoded",
            b"username=Roni&password=rahasia&name=Roni+Purwanto",
        )
        .await
        .unwrap();
        let xml = decode(
            "application/xml",
            b"<RegisterRequest>\n  <username>Roni</username>\n  <password>rahasia</password>\n  <name>Roni Purwanto</name>\n</RegisterRequest>",
        )
        .await
        .unwrap();

        for body in [json, form, xml] {
            assert_eq!(body.text("username"), Some("Roni"));
            assert_eq!(body.text("name"), Some("Roni Purwanto"));
        }
    }

    #[tokio::test]
    async fn aliases_bridge_per_format_names() {
        let json = decode(
            "application/json",
            br#"{"userName":"Roni","password":"rahasia","name":"Roni Purwanto"}"#,
        )
        .await
        .unwrap();
        let register: Register = json.parse().unwrap();
        assert_eq!(register.username, "Roni");

        let form = decode(
            "application/x-www-form-urlencoded",
            b"username=Roni&password=rahasia&name=Roni",
        )
        .await
        .unwrap();
        let register: Register = form.parse().unwrap();
        assert_eq!(register.username, "Roni");

        let xml = decode(
            "application/xml",
            b"<r><user-name>Roni</user-name><password>x</password><name>y</name></r>",
        )
        .await
        .unwrap();
        let register: Register = xml.parse().unwrap();
        assert_eq!(register.username, "Roni");
    }

    #[tokio::test]
    async fn content_type_parameters_are_ignored() {
        let body = decode("application/json; charset=utf-8", br#"{"a":"b"}"#)
            .await
            .unwrap();
        assert_eq!(body.text("a"), Some("b"));
    }

    #[tokio::test]
    async fn multipart_carries_fields_and_files() {
        let raw = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"caption\"\r\n",
            "\r\n",
            "an upload\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"contoh.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "ini contoh file yang akan di upload\r\n",
            "--XBOUNDARY--\r\n",
        );
        let body = decode("multipart/form-data; boundary=XBOUNDARY", raw.as_bytes())
            .await
            .unwrap();

        assert_eq!(body.text("caption"), Some("an upload"));
        let file = body.file("files").unwrap();
        assert_eq!(file.filename, "contoh.txt");
        assert_eq!(&file.bytes[..], b"ini contoh file yang akan di upload");
    }

    #[tokio::test]
    async fn malformed_body_reports_the_content_type() {
        let err = decode("application/json", b"{not json").await.unwrap_err();
        assert!(matches!(&err, Error::Decode { content_type, .. } if content_type.as_str() == "application/json"));

        let err = decode("application/xml", b"\xff\xfe").await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn unknown_content_type_is_a_decode_error() {
        let err = decode("application/msgpack", b"whatever").await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));

        let err = DecodedBody::decode(None, &Bytes::new()).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn json_must_be_an_object() {
        let err = decode("application/json", b"[1,2,3]").await.unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }
}
