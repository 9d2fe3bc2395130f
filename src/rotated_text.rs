use glam::DVec2;

use crate::export::{Canvas, TextAnchor, TextSpec};

/// Placement options for [`RotatedText::rotated_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPlacement {
    /// Center the text on its anchor point horizontally.
    pub middle_x: bool,
    /// Shift the baseline so the text is vertically centered on the anchor.
    pub middle_y: bool,
}

/// Rotation and anchor that keep text aligned with `angle` (degrees) while
/// never rendering it upside down.
pub fn orient(angle: f64) -> (f64, TextAnchor) {
    let mut angle = angle.rem_euclid(360.0);
    if angle > 180.0 {
        angle -= 360.0;
    }

    if angle > 90.0 {
        (angle - 180.0, TextAnchor::End)
    } else if angle < -90.0 {
        (angle + 180.0, TextAnchor::End)
    } else {
        (angle, TextAnchor::Start)
    }
}

pub trait RotatedText {
    fn rotated_text(
        &mut self,
        pos: DVec2,
        angle: f64,
        text: impl ToString,
        font_size: f64,
        color: &str,
        placement: LabelPlacement,
    ) -> TextSpec;
}

impl<C: Canvas + ?Sized> RotatedText for C {
    fn rotated_text(
        &mut self,
        pos: DVec2,
        angle: f64,
        text: impl ToString,
        font_size: f64,
        color: &str,
        placement: LabelPlacement,
    ) -> TextSpec {
        let (rotation, mut anchor) = orient(angle);
        if placement.middle_x {
            anchor = TextAnchor::Middle;
        }

        let mut baseline = pos;
        if placement.middle_y {
            baseline.y += 0.45 * font_size;
        }

        let text = text.to_string();
        let id = text.replace(' ', "_");
        let spec = TextSpec {
            pos: baseline,
            text,
            font_size,
            color: color.to_string(),
            anchor,
            rotation,
            rotation_center: pos,
            id: Some(id),
        };
        self.text(spec.clone());
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::recording::RecordingCanvas;

    #[test]
    fn right_half_reads_left_to_right() {
        assert_eq!(orient(0.0), (0.0, TextAnchor::Start));
        assert_eq!(orient(45.0), (45.0, TextAnchor::Start));
        assert_eq!(orient(300.0), (-60.0, TextAnchor::Start));
    }

    #[test]
    fn left_half_is_flipped() {
        assert_eq!(orient(180.0), (0.0, TextAnchor::End));
        assert_eq!(orient(135.0), (-45.0, TextAnchor::End));
        assert_eq!(orient(200.0), (20.0, TextAnchor::End));
    }

    #[test]
    fn middle_y_shifts_baseline_but_not_pivot() {
        let mut canvas = RecordingCanvas::new();
        let spec = canvas.rotated_text(
            DVec2::new(10.0, 20.0),
            0.0,
            "Leaf one",
            10.0,
            "black",
            LabelPlacement {
                middle_y: true,
                ..LabelPlacement::default()
            },
        );
        assert_eq!(spec.pos, DVec2::new(10.0, 24.5));
        assert_eq!(spec.rotation_center, DVec2::new(10.0, 20.0));
        assert_eq!(spec.id.as_deref(), Some("Leaf_one"));
        assert_eq!(canvas.all_primitives().len(), 1);
    }
}
