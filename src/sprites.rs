//! 1-bit sprite bitmaps, drawn in a single ink.

use embedded_graphics::geometry::Point;

pub const MAX_ROWS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    /// Bit `width - 1 - x` of row `y` is pixel (x, y).
    rows: [u16; MAX_ROWS],
}

impl Sprite {
    /// Builds a sprite from ASCII art, `#` set and anything else clear.
    pub const fn from_art(art: &[&str]) -> Sprite {
        assert!(!art.is_empty() && art.len() <= MAX_ROWS);
        let width = art[0].len();
        assert!(width <= 16);

        let mut rows = [0u16; MAX_ROWS];
        let mut y = 0;
        while y < art.len() {
            let line = art[y].as_bytes();
            assert!(line.len() == width, "ragged sprite art");
            let mut x = 0;
            while x < width {
                if line[x] == b'#' {
                    rows[y] |= 1 << (width - 1 - x);
                }
                x += 1;
            }
            y += 1;
        }
        Sprite {
            width: width as u32,
            height: art.len() as u32,
            rows,
        }
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.rows[y as usize] >> (self.width - 1 - x) & 1 == 1
    }

    /// Offsets of the set pixels, row by row.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let sprite = *self;
        (0..sprite.height).flat_map(move |y| {
            (0..sprite.width)
                .filter(move |&x| sprite.is_set(x, y))
                .map(move |x| Point::new(x as i32, y as i32))
        })
    }
}

pub const PLAYER: Sprite = Sprite::from_art(&[
    "......#......",
    ".....###.....",
    ".....###.....",
    ".###########.",
    "#############",
    "#############",
    "#############",
    "#############",
]);

pub const SQUID: [Sprite; 2] = [
    Sprite::from_art(&[
        "...##...",
        "..####..",
        ".######.",
        "##.##.##",
        "########",
        "..#..#..",
        ".#.##.#.",
        "#.#..#.#",
    ]),
    Sprite::from_art(&[
        "...##...",
        "..####..",
        ".######.",
        "##.##.##",
        "########",
        ".#.##.#.",
        "#......#",
        ".#....#.",
    ]),
];

pub const CRAB: [Sprite; 2] = [
    Sprite::from_art(&[
        "..#.....#..",
        "...#...#...",
        "..#######..",
        ".##.###.##.",
        "###########",
        "#.#######.#",
        "#.#.....#.#",
        "...##.##...",
    ]),
    Sprite::from_art(&[
        "..#.....#..",
        "#..#...#..#",
        "#.#######.#",
        "###.###.###",
        "###########",
        ".#########.",
        "..#.....#..",
        ".#.......#.",
    ]),
];

pub const OCTOPUS: [Sprite; 2] = [
    Sprite::from_art(&[
        "....###....",
        ".#########.",
        "###########",
        "###..#..###",
        "###########",
        "...##.##...",
        "..##.#.##..",
        "##.......##",
    ]),
    Sprite::from_art(&[
        "....###....",
        ".#########.",
        "###########",
        "###..#..###",
        "###########",
        "..###.###..",
        ".##..#..##.",
        "..##...##..",
    ]),
];

pub const SHOT: Sprite = Sprite::from_art(&["#", "#", "#", "#"]);

pub const BOMB: [Sprite; 2] = [
    Sprite::from_art(&[".#.", "#..", ".#.", "..#", ".#."]),
    Sprite::from_art(&[".#.", "..#", ".#.", "#..", ".#."]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn art_is_decoded_left_to_right() {
        let sprite = Sprite::from_art(&["#..", ".#.", "..#"]);
        assert!(sprite.is_set(0, 0));
        assert!(!sprite.is_set(1, 0));
        assert!(sprite.is_set(2, 2));
        assert!(!sprite.is_set(3, 0));
        assert_eq!(sprite.points().count(), 3);
    }

    #[test]
    fn invader_poses_share_a_footprint() {
        for poses in [SQUID, CRAB, OCTOPUS] {
            assert_eq!(poses[0].width, poses[1].width);
            assert_eq!(poses[0].height, poses[1].height);
            assert_ne!(poses[0], poses[1]);
        }
    }

    #[test]
    fn player_sprite_matches_its_hitbox() {
        assert_eq!(PLAYER.width as i32, crate::config::PLAYER_W);
        assert_eq!(PLAYER.height as i32, crate::config::PLAYER_H);
    }
}
