pub const ERRCTX_TAG_OPEN: &'static str = "after '<'";
pub const ERRCTX_MARKUP_DECL: &'static str = "after '<!'";
pub const ERRCTX_COMMENT_START: &'static str = "after '<!-'";
pub const ERRCTX_COMMENT_END: &'static str = "after '--' in comment";
pub const ERRCTX_ELEMENT: &'static str = "in element";
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
pub const ERRCTX_EMPTY_ELEMENT_CLOSE: &'static str = "after '/' in element";
pub const ERRCTX_PI_CLOSE: &'static str = "after '?' in element";
pub const ERRCTX_CDATA_SECTION_START: &'static str = "in CDATA section start";
