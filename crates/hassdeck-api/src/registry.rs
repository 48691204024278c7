// Registry dump via the template endpoint.
//
// The REST API has no registry endpoints, so the hub renders a JSON
// document of areas, devices and entity links from a Jinja template.

/// Template rendering every area, every device referenced by a state, and
/// the area/device link of every entity, as one JSON object.
pub const REGISTRY_TEMPLATE: &str = r#"
{%- set ns = namespace(areas=[], devices=[], entities=[], seen=[]) -%}
{%- for a in areas() -%}
{%- set ns.areas = ns.areas + [{"area_id": a, "name": area_name(a)}] -%}
{%- endfor -%}
{%- for s in states -%}
{%- set d = device_id(s.entity_id) -%}
{%- set ns.entities = ns.entities + [{"entity_id": s.entity_id, "area_id": area_id(s.entity_id), "device_id": d}] -%}
{%- if d and d not in ns.seen -%}
{%- set ns.seen = ns.seen + [d] -%}
{%- set ns.devices = ns.devices + [{"id": d, "name": device_attr(d, "name_by_user") or device_attr(d, "name"), "area_id": device_attr(d, "area_id"), "manufacturer": device_attr(d, "manufacturer"), "model": device_attr(d, "model")}] -%}
{%- endif -%}
{%- endfor -%}
{{ {"areas": ns.areas, "devices": ns.devices, "entities": ns.entities} | tojson }}
"#;

#[cfg(test)]
mod tests {
    use super::REGISTRY_TEMPLATE;

    #[test]
    fn template_emits_all_three_sections() {
        for key in ["\"areas\"", "\"devices\"", "\"entities\""] {
            assert!(REGISTRY_TEMPLATE.contains(key), "missing {key}");
        }
        assert!(REGISTRY_TEMPLATE.trim_end().ends_with("| tojson }}"));
    }
}
