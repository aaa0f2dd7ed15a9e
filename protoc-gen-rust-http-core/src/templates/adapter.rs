use super::render_module_footer;
use super::render_module_header;
use super::render_service_adapter;
use super::FileInput;
use crate::error::Result;

/// Renders the direct adapter file: one public handler struct per service.
pub fn render(input: &FileInput) -> Result<String> {
    let mut out = render_module_header(input, &input.module)?;
    for service in &input.services {
        out += &render_service_adapter(input, service, true)?;
    }
    out += &render_module_footer(input, &input.module)?;
    Ok(out)
}
