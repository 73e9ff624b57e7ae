/// Check if a name is a known HTML tag
pub fn is_native_tag(name: &str) -> bool {
    matches!(
        name,
        // Common HTML tags
        "a" | "abbr" | "address" | "area" | "article" | "aside" | "audio" |
        "b" | "base" | "bdi" | "bdo" | "blockquote" | "body" | "br" | "button" |
        "canvas" | "caption" | "cite" | "code" | "col" | "colgroup" |
        "data" | "datalist" | "dd" | "del" | "details" | "dfn" | "dialog" | "div" | "dl" | "dt" |
        "em" | "embed" |
        "fieldset" | "figcaption" | "figure" | "footer" | "form" |
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "header" | "hgroup" | "hr" | "html" |
        "i" | "iframe" | "img" | "input" | "ins" |
        "kbd" |
        "label" | "legend" | "li" | "link" |
        "main" | "map" | "mark" | "menu" | "meta" | "meter" |
        "nav" | "noscript" |
        "object" | "ol" | "optgroup" | "option" | "output" |
        "p" | "picture" | "pre" | "progress" |
        "q" |
        "rp" | "rt" | "ruby" |
        "s" | "samp" | "script" | "search" | "section" | "select" | "slot" | "small" | "source" | "span" | "strong" | "style" | "sub" | "summary" | "sup" | "svg" |
        "table" | "tbody" | "td" | "template" | "textarea" | "tfoot" | "th" | "thead" | "time" | "title" | "tr" | "track" |
        "u" | "ul" |
        "var" | "video" |
        "wbr"
    )
}

/// Void elements: no closing tag, no children.
pub fn is_void_tag(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Whether an attribute name is recognized HTML: a known global or common
/// per-element attribute, or a `data-*`/`aria-*` custom attribute. Unknown
/// names disqualify a subtree from string flattening because the serialized
/// markup could not round-trip through the browser parser faithfully.
pub fn is_known_attribute(name: &str) -> bool {
    if name.starts_with("data-") || name.starts_with("aria-") {
        return true;
    }
    matches!(
        name,
        "accept" | "accept-charset" | "accesskey" | "action" | "align" | "allow"
            | "allowfullscreen" | "alt" | "async" | "autocomplete" | "autofocus" | "autoplay"
            | "bgcolor" | "border" | "capture" | "charset" | "checked" | "cite" | "class"
            | "color" | "cols" | "colspan" | "content" | "contenteditable" | "controls"
            | "coords" | "crossorigin" | "datetime" | "decoding" | "default" | "defer" | "dir"
            | "dirname" | "disabled" | "download" | "draggable" | "enctype" | "enterkeyhint"
            | "for" | "form" | "formaction" | "formmethod" | "frameborder" | "headers"
            | "height" | "hidden" | "high" | "href" | "hreflang" | "http-equiv" | "id"
            | "inputmode" | "integrity" | "is" | "ismap" | "itemid" | "itemprop" | "itemref"
            | "itemscope" | "itemtype" | "kind" | "label" | "lang" | "list" | "loading"
            | "loop" | "low" | "max" | "maxlength" | "media" | "method" | "min" | "minlength"
            | "multiple" | "muted" | "name" | "novalidate" | "open" | "optimum" | "part"
            | "pattern" | "ping" | "placeholder" | "playsinline" | "poster" | "preload"
            | "readonly" | "referrerpolicy" | "rel" | "required" | "reversed" | "role"
            | "rows" | "rowspan" | "sandbox" | "scope" | "selected" | "shape" | "size"
            | "sizes" | "slot" | "span" | "spellcheck" | "src" | "srcdoc" | "srclang"
            | "srcset" | "start" | "step" | "style" | "tabindex" | "target" | "title"
            | "translate" | "type" | "usemap" | "value" | "width" | "wrap" | "xmlns"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_and_void_tags() {
        assert!(is_native_tag("div"));
        assert!(!is_native_tag("MyButton"));
        assert!(is_void_tag("img"));
        assert!(!is_void_tag("div"));
    }

    #[test]
    fn test_known_attributes() {
        assert!(is_known_attribute("class"));
        assert!(is_known_attribute("data-test-id"));
        assert!(is_known_attribute("aria-label"));
        assert!(!is_known_attribute("my-custom-prop"));
    }
}
