//! Text rendering of view events.

use mcpanel_core::{ViewEvent, format_bytes};

pub fn render(event: &ViewEvent) -> String {
    match event {
        ViewEvent::ChannelStatus(status) => format!("* websocket: {status}"),
        ViewEvent::Notice(notice) => notice.to_string(),
        ViewEvent::ProcessList(list) if list.is_empty() => "* no running servers".to_string(),
        ViewEvent::ProcessList(list) => {
            let mut out = String::from("* running servers:");
            for p in list {
                out.push_str(&format!("\n    {} ({})", p.display_name, p.name));
            }
            out
        }
        ViewEvent::Session(session) => format!("* session: {session}"),
        ViewEvent::ConsoleLine(line) => format!("| {line}"),
        ViewEvent::ConsoleCleared => "* console cleared".to_string(),
        ViewEvent::Telemetry { sample, advanced } => format!(
            "* mem {:.1}% of {} | cpu {:.1}% @ {:.0} MHz | net {}/s up {}/s down | {advanced}",
            sample.memory_usage_percent,
            format_bytes(sample.memory_total),
            sample.cpu_usage_percent,
            sample.cpu_frequency_mhz,
            format_bytes(sample.network_io.sent),
            format_bytes(sample.network_io.recv),
        ),
        ViewEvent::AdvancedMetrics(advanced) => format!("* {advanced}"),
        ViewEvent::SearchResults(entries) => {
            let mut out = format!("* {} installed servers:", entries.len());
            for e in entries {
                if e.valid {
                    out.push_str(&format!("\n    {} ({})", e.display_name, e.name));
                } else {
                    out.push_str(&format!("\n    {} ({}) unusable: {}", e.display_name, e.name, e.reason));
                }
            }
            out
        }
        ViewEvent::Selection(Some(name)) => format!("* selected: {name}"),
        ViewEvent::Selection(None) => "* selection cleared".to_string(),
        ViewEvent::ConfigLoaded {
            server_name,
            details,
        } => {
            let mut out = format!("* configuration of {server_name}:");
            for (k, v) in &details.info {
                out.push_str(&format!("\n    [version] {k} = {v}"));
            }
            for (k, v) in &details.properties {
                out.push_str(&format!("\n    [properties] {k} = {v}"));
            }
            out.push_str(&format!("\n    [start_script] {}", details.start_script));
            out
        }
        ViewEvent::Components {
            server_name,
            components,
        } => {
            let mut out = format!("* components of {server_name}:");
            for (kind, files) in components {
                if files.is_empty() {
                    out.push_str(&format!("\n    {kind}: empty"));
                }
                for f in files {
                    out.push_str(&format!("\n    {kind}: {} ({})", f.name, format_bytes(f.size as f64)));
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpanel_core::{ChannelStatus, ComponentFile, ComponentMap, Notice};

    #[test]
    fn renders_status_and_notices() {
        assert_eq!(
            render(&ViewEvent::ChannelStatus(ChannelStatus::Online)),
            "* websocket: online"
        );
        assert_eq!(render(&ViewEvent::Notice(Notice::success("saved"))), "[ok] saved");
        assert_eq!(render(&ViewEvent::ConsoleLine("hi".into())), "| hi");
    }

    #[test]
    fn renders_component_sizes() {
        let mut components = ComponentMap::new();
        components.insert(
            "mods".into(),
            vec![ComponentFile {
                name: "spark.jar".into(),
                size: 2048,
                mtime: 0.0,
            }],
        );
        components.insert("schematics".into(), Vec::new());
        let text = render(&ViewEvent::Components {
            server_name: "S1".into(),
            components,
        });
        assert!(text.contains("mods: spark.jar (2 KB)"));
        assert!(text.contains("schematics: empty"));
    }
}
