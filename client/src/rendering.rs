//! Plain-text board dump for the terminal front end

use crate::game::ClientBoard;
use shared::GoalList;
use std::fmt::Write;

const CELL_WIDTH: usize = 22;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        format!("{:<width$}", text, width = width)
    } else {
        let clipped: String = text.chars().take(width - 1).collect();
        format!("{}~", clipped)
    }
}

/// Renders the board as a grid; hidden cells show as `???`
pub fn render_board(board: &ClientBoard, goals: &GoalList) -> String {
    let size = board.size();
    let separator = format!("+{}\n", format!("{}+", "-".repeat(CELL_WIDTH + 2)).repeat(size));
    let mut out = separator.clone();

    for row in 0..size {
        let mut text_line = String::from("|");
        let mut marker_line = String::from("|");
        for col in 0..size {
            let index = row * size + col;
            let Some(cell) = board.board().cell(index) else {
                continue;
            };

            let label = if board.is_visible(index) {
                format!("{:>3} {}", index, goals.describe(cell.goal_index()))
            } else {
                format!("{:>3} ???", index)
            };
            let markers: Vec<String> = cell.markers().iter().map(|c| c.to_string()).collect();

            let _ = write!(text_line, " {} |", clip(&label, CELL_WIDTH));
            let _ = write!(marker_line, " {} |", clip(&markers.join(" "), CELL_WIDTH));
        }
        out.push_str(&text_line);
        out.push('\n');
        out.push_str(&marker_line);
        out.push('\n');
        out.push_str(&separator);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Rgb;

    #[test]
    fn test_clip() {
        assert_eq!(clip("abc", 5), "abc  ");
        assert_eq!(clip("abcdefgh", 5), "abcd~");
    }

    #[test]
    fn test_render_hides_invisible_goals() {
        let goals = GoalList::from_descriptions(["alpha", "bravo", "charlie", "delta"]);
        let mut board = ClientBoard::new(2, &[3, 2, 1, 0], Some(Rgb::new(255, 0, 0))).unwrap();
        board.apply_mark(0, Rgb::new(0, 0, 255)).unwrap();

        let text = render_board(&board, &goals);
        // a 2x2 board starts fully visible
        assert!(text.contains("0 delta"));
        assert!(text.contains("3 alpha"));
        assert!(text.contains("#0000ff"));
        assert_eq!(text.lines().count(), 1 + 2 * 3);

        let goals: Vec<u8> = (0..9).collect();
        let board = ClientBoard::new(3, &goals, Some(Rgb::new(255, 0, 0))).unwrap();
        let many = GoalList::from_descriptions((0..9).map(|i| format!("goal {}", i)));
        let text = render_board(&board, &many);
        assert!(text.contains("0 ???"));
        assert!(text.contains("4 goal 4"));
    }
}
