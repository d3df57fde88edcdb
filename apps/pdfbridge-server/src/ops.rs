//! The operation table.
//!
//! Every route under `/api/pdf/{op}` resolves to one entry here. The entry
//! carries the admission allow-list, how the operation is executed, and the
//! response headers. Admission rules live in exactly one place so no route
//! can drift from the others.

pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOC: &str = "application/msword";
pub const PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const PPT: &str = "application/vnd.ms-powerpoint";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS: &str = "application/vnd.ms-excel";
pub const JPEG: &str = "image/jpeg";

/// Most files a multi-upload operation will accept.
pub const MAX_UPLOADS: usize = 10;

/// How an operation is executed once its uploads are staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Combine two or more PDFs via the assembly adapter.
    Merge,
    /// Recompress a single PDF via the assembly adapter.
    Compress,
    /// One page per uploaded image via the assembly adapter.
    ImagesToPdf,
    /// Hand a single staged file to the external conversion engine.
    Engine { target_ext: &'static str },
}

/// One row of the operation table.
#[derive(Debug)]
pub struct OpSpec {
    /// Route segment under `/api/pdf/`.
    pub name: &'static str,
    pub kind: OpKind,
    /// Declared MIME types admitted for this operation. An entry ending in
    /// `/*` matches the whole top-level type.
    pub accept: &'static [&'static str],
    /// Content type of the successful response.
    pub response_type: &'static str,
    /// Attachment filename of the successful response.
    pub download_name: &'static str,
}

impl OpSpec {
    /// Minimum number of uploaded files this operation needs.
    pub fn min_uploads(&self) -> usize {
        match self.kind {
            OpKind::Merge => 2,
            _ => 1,
        }
    }

    /// Maximum number of uploaded files this operation accepts.
    pub fn max_uploads(&self) -> usize {
        match self.kind {
            OpKind::Merge | OpKind::ImagesToPdf => MAX_UPLOADS,
            _ => 1,
        }
    }

    /// Whether a declared MIME type passes this operation's allow-list.
    pub fn accepts(&self, mime: &str) -> bool {
        self.accept.iter().any(|allowed| {
            if let Some(prefix) = allowed.strip_suffix("/*") {
                mime.split('/').next() == Some(prefix)
            } else {
                allowed.eq_ignore_ascii_case(mime)
            }
        })
    }
}

pub static OPERATIONS: &[OpSpec] = &[
    OpSpec {
        name: "merge",
        kind: OpKind::Merge,
        accept: &[PDF],
        response_type: PDF,
        download_name: "merged.pdf",
    },
    OpSpec {
        name: "compress",
        kind: OpKind::Compress,
        accept: &[PDF],
        response_type: PDF,
        download_name: "compressed.pdf",
    },
    OpSpec {
        name: "pdf-to-word",
        kind: OpKind::Engine { target_ext: "docx" },
        accept: &[PDF],
        response_type: DOCX,
        download_name: "converted.docx",
    },
    OpSpec {
        name: "pdf-to-powerpoint",
        kind: OpKind::Engine { target_ext: "pptx" },
        accept: &[PDF],
        response_type: PPTX,
        download_name: "converted.pptx",
    },
    OpSpec {
        name: "pdf-to-excel",
        kind: OpKind::Engine { target_ext: "xlsx" },
        accept: &[PDF],
        response_type: XLSX,
        download_name: "converted.xlsx",
    },
    OpSpec {
        name: "word-to-pdf",
        kind: OpKind::Engine { target_ext: "pdf" },
        accept: &[DOCX, DOC],
        response_type: PDF,
        download_name: "converted.pdf",
    },
    OpSpec {
        name: "powerpoint-to-pdf",
        kind: OpKind::Engine { target_ext: "pdf" },
        accept: &[PPTX, PPT],
        response_type: PDF,
        download_name: "converted.pdf",
    },
    OpSpec {
        name: "excel-to-pdf",
        kind: OpKind::Engine { target_ext: "pdf" },
        accept: &[XLSX, XLS],
        response_type: PDF,
        download_name: "converted.pdf",
    },
    OpSpec {
        name: "jpg-to-pdf",
        kind: OpKind::ImagesToPdf,
        accept: &["image/*"],
        response_type: PDF,
        download_name: "converted.pdf",
    },
    OpSpec {
        name: "pdf-to-jpg",
        kind: OpKind::Engine { target_ext: "jpg" },
        accept: &[PDF],
        response_type: JPEG,
        download_name: "converted.jpg",
    },
];

/// Resolve an operation by its route segment.
pub fn lookup(name: &str) -> Option<&'static OpSpec> {
    OPERATIONS.iter().find(|op| op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn every_operation_has_an_allow_list() {
        for op in OPERATIONS {
            assert!(!op.accept.is_empty(), "{} has no allow-list", op.name);
            assert!(!op.response_type.is_empty());
            assert!(!op.download_name.is_empty());
        }
    }

    #[test]
    fn lookup_finds_all_table_entries() {
        for op in OPERATIONS {
            assert!(lookup(op.name).is_some());
        }
        assert!(lookup("rotate").is_none());
    }

    #[test]
    fn merge_requires_two_uploads() {
        let merge = lookup("merge").unwrap();
        assert_eq!(merge.min_uploads(), 2);
        assert_eq!(merge.max_uploads(), MAX_UPLOADS);
    }

    #[test]
    fn engine_ops_take_exactly_one_upload() {
        let op = lookup("pdf-to-word").unwrap();
        assert_eq!(op.min_uploads(), 1);
        assert_eq!(op.max_uploads(), 1);
    }

    #[test]
    fn wildcard_accept_matches_top_level_type() {
        let op = lookup("jpg-to-pdf").unwrap();
        assert!(op.accepts("image/jpeg"));
        assert!(op.accepts("image/png"));
        assert!(!op.accepts("application/pdf"));
    }

    #[test]
    fn mime_match_is_case_insensitive() {
        let op = lookup("merge").unwrap();
        assert!(op.accepts("Application/PDF"));
        assert!(!op.accepts("text/plain"));
    }

    proptest! {
        /// Names not in the table never resolve.
        #[test]
        fn unknown_names_do_not_resolve(name in "[a-z-]{1,24}") {
            prop_assume!(OPERATIONS.iter().all(|op| op.name != name));
            prop_assert!(lookup(&name).is_none());
        }

        /// Random MIME types never pass a PDF-only allow-list.
        #[test]
        fn pdf_only_ops_reject_other_types(mime in "[a-z]{2,10}/[a-z0-9.-]{2,20}") {
            prop_assume!(mime != PDF);
            let merge = lookup("merge").unwrap();
            prop_assert!(!merge.accepts(&mime));
        }
    }
}
