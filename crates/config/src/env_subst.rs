/// Replace `${VAR}` and `${VAR:-default}` placeholders in raw config text.
///
/// A variable that is unset (or empty, when a default is given) falls back to
/// the default; without a default the placeholder is kept verbatim. An
/// unterminated `${` is copied through unchanged.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        let value = if name.is_empty() {
            None
        } else {
            lookup(name).filter(|v| default.is_none() || !v.is_empty())
        };
        match (value, default) {
            (Some(v), _) => out.push_str(&v),
            (None, Some(d)) => out.push_str(d),
            (None, None) => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    fn vars() -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> =
            HashMap::from([("CB_HOST", "cb.example"), ("EMPTY", "")]);
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    #[serial_test::serial]
    #[allow(unsafe_code)]
    fn reads_process_env() {
        unsafe { std::env::set_var("DECOY_TEST_CALLBACK_HOST", "cb.example") };
        assert_eq!(
            substitute_env("url = \"https://${DECOY_TEST_CALLBACK_HOST}/report\""),
            "url = \"https://cb.example/report\""
        );
        unsafe { std::env::remove_var("DECOY_TEST_CALLBACK_HOST") };
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("https://${CB_HOST}/r", vars()),
            "https://cb.example/r"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("a ${NOPE} b", vars()),
            "a ${NOPE} b"
        );
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(substitute_with("${NOPE:-8080}", vars()), "8080");
        assert_eq!(substitute_with("${EMPTY:-x}", vars()), "x");
        assert_eq!(substitute_with("${CB_HOST:-x}", vars()), "cb.example");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_with("key=${OPEN", vars()), "key=${OPEN");
        assert_eq!(substitute_with("${} ok", vars()), "${} ok");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_with("plain $text", vars()), "plain $text");
    }
}
