use crate::render::{draw_overlay_popup, write_hud_rows, ColorCache, Frame, Renderer};
use std::io::Write;

// Braille dot bit layout for a 2x4 pixel cell, row-major.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

/// 2x4 pixels per cell via U+2800 braille patterns; dots above the local
/// luma midpoint light up as foreground.
pub struct BrailleRenderer {
    colors: ColorCache,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::default(),
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        let h = frame.pixel_height;

        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if w != cols.saturating_mul(2) || h != visual_rows.saturating_mul(4) {
            return Ok(());
        }
        if frame.pixels_rgba.len() < w.saturating_mul(h).saturating_mul(4) {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        out.write_all(b"\x1b[H\x1b[0m")?;
        out.write_all(b"\x1b[?7l")?;
        self.colors.reset();

        for row in 0..visual_rows {
            let base_y = row * 4;
            for col in 0..cols {
                let base_x = col * 2;

                let mut lum = [0u16; 8];
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        let i = dy * 2 + dx;
                        let idx = ((base_y + dy) * w + base_x + dx) * 4;
                        let r = frame.pixels_rgba[idx];
                        let g = frame.pixels_rgba[idx + 1];
                        let b = frame.pixels_rgba[idx + 2];
                        rgb[i] = (r, g, b);
                        lum[i] = luma_u16(r, g, b);
                    }
                }

                let min_l = lum.iter().copied().min().unwrap_or(0);
                let max_l = lum.iter().copied().max().unwrap_or(0);
                let thr = (min_l + max_l) / 2;

                let mut bits: u8 = 0;
                let mut on = (0u32, 0u32, 0u32, 0u32);
                let mut off = (0u32, 0u32, 0u32, 0u32);
                for i in 0..8usize {
                    let (r, g, b) = rgb[i];
                    if lum[i] > thr {
                        bits |= DOT_BITS[i];
                        on = (on.0 + r as u32, on.1 + g as u32, on.2 + b as u32, on.3 + 1);
                    } else {
                        off = (off.0 + r as u32, off.1 + g as u32, off.2 + b as u32, off.3 + 1);
                    }
                }

                let avg = |acc: (u32, u32, u32, u32)| {
                    if acc.3 == 0 {
                        (0u8, 0u8, 0u8)
                    } else {
                        ((acc.0 / acc.3) as u8, (acc.1 / acc.3) as u8, (acc.2 / acc.3) as u8)
                    }
                };

                let (fgc, bgc, ch) = if bits == 0 {
                    let c = avg(off);
                    (c, c, ' ')
                } else {
                    let fgc = avg(on);
                    let bgc = if off.3 > 0 { avg(off) } else { fgc };
                    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                    (fgc, bgc, ch)
                };

                self.colors.set_fg(out, fgc)?;
                self.colors.set_bg(out, bgc)?;
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }

        write_hud_rows(out, frame, visual_rows, cols)?;

        if let Some(text) = frame.overlay {
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
        }

        out.write_all(b"\x1b[?7h")?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[inline]
fn luma_u16(r: u8, g: u8, b: u8) -> u16 {
    // Approx Rec.709 luma using integer math (0..255).
    let y = (r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8;
    y as u16
}
