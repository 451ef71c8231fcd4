//! Borderless table rendering for agent listings

use super::Agent;

/// Characters of the command line always shown in narrow mode
pub const MIN_CMD_WIDTH: usize = 16;

/// Padding between columns
const COLUMN_GAP: &str = "   ";

/// Columns left free at the right edge of a narrow row
const RIGHT_MARGIN: usize = 3;

/// Source of the terminal width used to clip command lines
pub trait WidthProvider {
    /// Width in columns, or `None` when it cannot be determined
    fn width(&self) -> Option<usize>;
}

/// Width of the attached terminal
pub struct TerminalWidth;

impl WidthProvider for TerminalWidth {
    fn width(&self) -> Option<usize> {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, _)| cols as usize)
            .filter(|cols| *cols > 0)
    }
}

/// A fixed width, mostly for tests and non-interactive output
pub struct FixedWidth(pub Option<usize>);

impl WidthProvider for FixedWidth {
    fn width(&self) -> Option<usize> {
        self.0
    }
}

/// Clips `cmd_line` so a row fits the terminal.
///
/// `prefix_len` is the space taken by the columns before the command. At
/// least [`MIN_CMD_WIDTH`] characters are kept even on narrow or unknown
/// terminals.
pub fn simple_cmdline(prefix_len: usize, cmd_line: &str, width: Option<usize>) -> String {
    let width = match width {
        Some(w) if w > prefix_len + MIN_CMD_WIDTH => w,
        _ => prefix_len + MIN_CMD_WIDTH,
    };
    let room = width - prefix_len;

    if cmd_line.chars().count() > room {
        cmd_line.chars().take(room).collect()
    } else {
        cmd_line.to_string()
    }
}

/// Renders agents as a left aligned table without borders.
///
/// Wide mode shows every field; narrow mode shows id, remote ip and a
/// command line clipped so no row exceeds the terminal width.
pub fn render_agents(agents: &[Agent], wide: bool, widths: &dyn WidthProvider) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(agents.len() + 1);

    if wide {
        rows.push(header(&["ID", "REMOTEIP", "HOSTNAME", "PID", "CMD"]));
        for agent in agents {
            rows.push(vec![
                agent.id.clone(),
                agent.remote_ip.clone(),
                agent.hostname.clone(),
                agent.pid.clone(),
                agent.cmd_line.clone(),
            ]);
        }
        return format_rows(&rows);
    }

    // Every row shares the padded id and remote ip columns, so the
    // command column starts at the same offset on each of them.
    let id_width = column_width("ID", agents.iter().map(|a| a.id.as_str()));
    let ip_width = column_width("REMOTEIP", agents.iter().map(|a| a.remote_ip.as_str()));
    let prefix_len = id_width + ip_width + 2 * COLUMN_GAP.len() + RIGHT_MARGIN;
    let width = widths.width();

    rows.push(header(&["ID", "REMOTEIP", "CMD"]));
    for agent in agents {
        rows.push(vec![
            agent.id.clone(),
            agent.remote_ip.clone(),
            simple_cmdline(prefix_len, &agent.cmd_line, width),
        ]);
    }

    format_rows(&rows)
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn column_width<'a>(title: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|c| c.chars().count())
        .fold(title.chars().count(), usize::max)
}

fn format_rows(rows: &[Vec<String>]) -> String {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push_str(COLUMN_GAP);
            }
            line.push_str(cell);
            let pad = widths[i] - cell.chars().count();
            line.extend(std::iter::repeat(' ').take(pad));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}
