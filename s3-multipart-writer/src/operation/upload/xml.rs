/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use quick_xml::escape::partial_escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::types::CompletedPart;

/// Text content of the first element called `name`, anywhere in the document.
pub(crate) fn element_text(body: &[u8], name: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(body);
    let mut inside = false;
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == name.as_bytes() => inside = true,
            Event::Text(e) if inside => text.push_str(&e.unescape()?),
            Event::End(e) if inside && e.name().as_ref() == name.as_bytes() => {
                return Ok(Some(text.trim().to_owned()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Build the `CompleteMultipartUpload` request body.
///
/// `parts` must already be sorted by part number.
pub(crate) fn complete_manifest(parts: &[CompletedPart]) -> Bytes {
    let mut body = String::from("<CompleteMultipartUpload>");
    for part in parts {
        body.push_str("<Part><PartNumber>");
        body.push_str(&part.part_number.to_string());
        body.push_str("</PartNumber><ETag>");
        body.push_str(&partial_escape(&part.e_tag));
        body.push_str("</ETag></Part>");
    }
    body.push_str("</CompleteMultipartUpload>");
    Bytes::from(body)
}

#[cfg(test)]
mod tests {
    use super::{complete_manifest, element_text};
    use crate::types::CompletedPart;

    const INITIATE_RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Bucket>example-bucket</Bucket>
  <Key>example-object</Key>
  <UploadId>VXBsb2FkIElEIGZvciA2aWWpbmcncyBteS1tb3ZpZS5tMnRzIHVwbG9hZA</UploadId>
</InitiateMultipartUploadResult>"#;

    #[test]
    fn test_upload_id_extracted() {
        let upload_id = element_text(INITIATE_RESULT.as_bytes(), "UploadId").unwrap();
        assert_eq!(
            Some("VXBsb2FkIElEIGZvciA2aWWpbmcncyBteS1tb3ZpZS5tMnRzIHVwbG9hZA".to_owned()),
            upload_id
        );
    }

    #[test]
    fn test_missing_element() {
        let upload_id = element_text(b"<Error><Code>AccessDenied</Code></Error>", "UploadId");
        assert_eq!(None, upload_id.unwrap());
    }

    #[test]
    fn test_manifest_lists_parts_in_order() {
        let parts = vec![
            CompletedPart {
                part_number: 1,
                e_tag: "\"etag-1\"".into(),
                size: 10,
            },
            CompletedPart {
                part_number: 2,
                e_tag: "etag-2".into(),
                size: 5,
            },
        ];
        let manifest = complete_manifest(&parts);
        assert_eq!(
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>\"etag-1\"</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>etag-2</ETag></Part>\
             </CompleteMultipartUpload>",
            std::str::from_utf8(&manifest).unwrap()
        );
    }
}
