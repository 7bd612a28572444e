//! Desktop bar child geometry

use crate::utils::Rect;

/// Horizontal margins consumed around the children
pub const LAYOUT_MARGINS: i32 = 7;

/// Measurements the layout depends on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutInput {
    pub width: i32,
    pub height: i32,
    pub start_width: i32,
    pub quick_launch_width: i32,
    pub notify_width: i32,
}

/// Positions of the bar children in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    pub start_button: Rect,
    pub quick_launch: Rect,
    pub taskbar: Rect,
    pub notify_area: Rect,
}

/// Start button at the left edge, quick launch after it, notification area
/// at the right edge, taskbar taking what is left (never negative).
pub fn compute_layout(input: LayoutInput) -> BarLayout {
    let LayoutInput {
        width: w,
        height: h,
        start_width: s,
        quick_launch_width: q,
        notify_width: n,
    } = input;

    BarLayout {
        start_button: Rect::new(2, 2, s, h - 8),
        quick_launch: Rect::new(s + 6, 1, q, h - 2),
        taskbar: Rect::new(s + 6 + q, 0, (w - s - 6 - q - (n + 1)).max(0), h),
        notify_area: Rect::new(w - (n + 1), 1, n, h - 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(w: i32, s: i32, q: i32, n: i32) -> LayoutInput {
        LayoutInput {
            width: w,
            height: 28,
            start_width: s,
            quick_launch_width: q,
            notify_width: n,
        }
    }

    #[test]
    fn taskbar_takes_the_remaining_width() {
        let layout = compute_layout(input(800, 86, 140, 160));
        assert_eq!(layout.taskbar, Rect::new(232, 0, 407, 28));
        assert_eq!(layout.start_button, Rect::new(2, 2, 86, 20));
        assert_eq!(layout.quick_launch, Rect::new(92, 1, 140, 26));
        assert_eq!(layout.notify_area, Rect::new(639, 1, 160, 26));
    }

    #[test]
    fn widths_and_margins_sum_to_bar_width() {
        let i = input(1024, 60, 100, 90);
        let layout = compute_layout(i);
        assert_eq!(
            layout.taskbar.width + i.start_width + i.quick_launch_width + i.notify_width + LAYOUT_MARGINS,
            i.width
        );
    }

    #[test]
    fn taskbar_width_clamps_at_zero() {
        let layout = compute_layout(input(200, 86, 140, 160));
        assert_eq!(layout.taskbar.width, 0);
    }

    #[test]
    fn missing_children_count_as_zero_width() {
        let layout = compute_layout(input(800, 86, 0, 0));
        assert_eq!(layout.taskbar.x, 92);
        assert_eq!(layout.taskbar.width, 800 - 86 - 6 - 1);
    }
}
