// Variable interpolation (§4.3 step 5, Design Note in SPEC_FULL §9).
//
// Operates on the textual YAML before the typed decode, substituting
// `${NAME}` and `${component.output}` tokens. Three-step resolution order:
// combined variables, component outputs, otherwise left untouched so a
// later pass (e.g. at apply time, once prior stages have run) can resolve
// it.

use std::collections::HashMap;

/// Replaces every `${...}` token in `text` using `variables` first, then
/// `component_outputs` (keyed `"component.output"`), leaving anything
/// neither map resolves untouched.
pub fn interpolate(
    text: &str,
    variables: &HashMap<String, String>,
    component_outputs: &HashMap<String, String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let token = &after[..end];
                match variables.get(token).or_else(|| component_outputs.get(token)) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(token);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Merges stack-level variables with service-level variables, the latter
/// namespaced as `{service-name}.{key}` (§4.3 step 4).
pub fn combined_variables(
    stack_vars: &HashMap<String, String>,
    service_name: &str,
    service_vars: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut combined = stack_vars.clone();
    for (k, v) in service_vars {
        combined.insert(format!("{service_name}.{k}"), v.clone());
    }
    combined
}
