//! Boundary to whatever hosts the view. The view may ask for a new size
//! when switching between compact and expanded layouts; hosts that ignore
//! the request keep their default geometry.

use crossterm::{execute, terminal::SetSize};
use std::io;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u16,
    pub height: u16,
    pub compact: bool,
}

impl ResizeRequest {
    pub const COMPACT: ResizeRequest = ResizeRequest {
        width: 350,
        height: 500,
        compact: true,
    };
    pub const EXPANDED: ResizeRequest = ResizeRequest {
        width: 1100,
        height: 760,
        compact: false,
    };

    pub fn for_mode(compact: bool) -> Self {
        if compact { Self::COMPACT } else { Self::EXPANDED }
    }
}

pub trait HostShell {
    fn request_resize(&mut self, request: ResizeRequest);
}

/// Host that ignores resize requests.
#[derive(Debug, Default)]
pub struct NoopShell;

impl HostShell for NoopShell {
    fn request_resize(&mut self, request: ResizeRequest) {
        debug!(?request, "resize request ignored");
    }
}

/// Asks the terminal emulator to resize, converting pixels to character
/// cells. Many emulators ignore this; that is fine.
#[derive(Debug)]
pub struct TerminalShell {
    cell_width: u16,
    cell_height: u16,
}

impl Default for TerminalShell {
    fn default() -> Self {
        Self {
            cell_width: 8,
            cell_height: 16,
        }
    }
}

impl TerminalShell {
    pub fn cells(&self, request: ResizeRequest) -> (u16, u16) {
        (
            (request.width / self.cell_width).max(1),
            (request.height / self.cell_height).max(1),
        )
    }
}

impl HostShell for TerminalShell {
    fn request_resize(&mut self, request: ResizeRequest) {
        let (cols, rows) = self.cells(request);
        if let Err(e) = execute!(io::stdout(), SetSize(cols, rows)) {
            debug!(error = %e, "terminal resize not supported");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_sizes_map_to_cells() {
        let shell = TerminalShell::default();
        assert_eq!(shell.cells(ResizeRequest::COMPACT), (43, 31));
        assert_eq!(shell.cells(ResizeRequest::EXPANDED), (137, 47));
    }
}
