use crate::app::{route_table, RouteEntry};
use crate::cli::OutputFormat;
use crate::schema::catalog;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let routes = route_table(&catalog::all());
    println!("{}", render(&routes, &output_format)?);
    Ok(())
}

fn render(routes: &[RouteEntry], output_format: &OutputFormat) -> anyhow::Result<String> {
    match output_format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(routes)?),
        OutputFormat::Text => {
            let width = routes.iter().map(|r| r.path.len()).max().unwrap_or(0);
            let lines: Vec<String> = routes
                .iter()
                .map(|r| {
                    format!(
                        "{:<7} {:<width$}  {} ({})",
                        r.method,
                        r.path,
                        r.resource,
                        r.tenant,
                        width = width
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
