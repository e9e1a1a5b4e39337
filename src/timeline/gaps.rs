//! Compression of long quiet stretches on the time axis.
//!
//! When consecutive events are further apart than a threshold, the space
//! between them is squeezed into a fixed-height band and everything after it
//! moves up by the height saved. The resulting [`TimeAxis`] maps years to
//! display offsets (and back) so events, ticks and the cursor all agree on
//! where a given moment is drawn.

use super::types::PositionedEvent;

/// Gap compression parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapCompression {
    /// Gaps longer than this many years are compressed
    pub threshold_years: f64,
    /// Height in pixels a compressed gap is drawn with
    pub compressed_height: f64,
}

impl Default for GapCompression {
    fn default() -> Self {
        Self {
            threshold_years: 50.0,
            compressed_height: 80.0,
        }
    }
}

/// Visual break drawn where a gap was compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct GapMarker {
    pub start_year: f64,
    pub end_year: f64,
    /// Display offset of the top of the compressed band
    pub y: f64,
    pub height: f64,
    /// Pixels removed from the layout by this gap
    pub saved: f64,
}

impl GapMarker {
    pub fn years(&self) -> f64 {
        self.end_year - self.start_year
    }

    pub fn label(&self) -> String {
        format!("~{} year gap", self.years().round() as i64)
    }
}

/// Piecewise-linear mapping from fractional years to display offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    min_year: f64,
    pixels_per_year: f64,
    markers: Vec<GapMarker>,
}

impl TimeAxis {
    /// Uncompressed axis: `y = (year - min_year) * pixels_per_year`.
    pub fn linear(min_year: f64, pixels_per_year: f64) -> Self {
        Self {
            min_year,
            pixels_per_year,
            markers: Vec::new(),
        }
    }

    /// Build an axis that compresses every qualifying gap between `sorted_years`.
    ///
    /// A gap only qualifies when drawing it at full scale would take more
    /// than `compressed_height`, so compression never stretches the layout.
    pub fn compressed(
        sorted_years: &[f64],
        min_year: f64,
        pixels_per_year: f64,
        compression: GapCompression,
    ) -> Self {
        let mut axis = Self::linear(min_year, pixels_per_year);
        let mut offset = 0.0;

        for pair in sorted_years.windows(2) {
            let (start_year, end_year) = (pair[0], pair[1]);
            let gap_years = end_year - start_year;
            if gap_years <= compression.threshold_years {
                continue;
            }

            let full_height = gap_years * pixels_per_year;
            if full_height <= compression.compressed_height {
                continue;
            }

            let saved = full_height - compression.compressed_height;
            axis.markers.push(GapMarker {
                start_year,
                end_year,
                y: axis.linear_y(start_year) - offset,
                height: compression.compressed_height,
                saved,
            });
            offset += saved;
        }

        if !axis.markers.is_empty() {
            tracing::debug!(
                gaps = axis.markers.len(),
                saved_px = offset,
                "compressed timeline gaps"
            );
        }
        axis
    }

    pub fn pixels_per_year(&self) -> f64 {
        self.pixels_per_year
    }

    pub fn markers(&self) -> &[GapMarker] {
        &self.markers
    }

    /// Total pixels removed by all compressed gaps.
    #[cfg(test)]
    pub fn total_saved(&self) -> f64 {
        self.markers.iter().map(|m| m.saved).sum()
    }

    fn linear_y(&self, year: f64) -> f64 {
        (year - self.min_year) * self.pixels_per_year
    }

    /// Display offset of a fractional year.
    pub fn y_for_year(&self, year: f64) -> f64 {
        let mut offset = 0.0;
        for marker in &self.markers {
            if year >= marker.end_year {
                offset += marker.saved;
                continue;
            }
            if year > marker.start_year {
                let t = (year - marker.start_year) / marker.years();
                return marker.y + t * marker.height;
            }
            break;
        }
        self.linear_y(year) - offset
    }

    /// Fractional year drawn at a display offset (inverse of [`Self::y_for_year`]).
    pub fn year_at(&self, y: f64) -> f64 {
        let mut offset = 0.0;
        for marker in &self.markers {
            if y < marker.y {
                break;
            }
            if y <= marker.y + marker.height {
                let t = if marker.height > 0.0 { (y - marker.y) / marker.height } else { 0.0 };
                return marker.start_year + t * marker.years();
            }
            offset += marker.saved;
        }
        self.min_year + (y + offset) / self.pixels_per_year
    }

    /// True when `year` lies strictly inside a compressed band.
    pub fn is_compressed(&self, year: f64) -> bool {
        self.markers
            .iter()
            .any(|m| year > m.start_year && year < m.end_year)
    }

    /// Move events to their display offsets on this axis.
    ///
    /// Both the connector anchor and the card start at the compressed
    /// position; card stacking runs afterwards.
    pub fn apply(&self, events: Vec<PositionedEvent>) -> Vec<PositionedEvent> {
        events
            .into_iter()
            .map(|mut event| {
                event.event_y = self.y_for_year(event.fractional_year);
                event.card_y = event.event_y;
                event
            })
            .collect()
    }
}
