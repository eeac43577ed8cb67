// Body vs tile separation and a simple grid-backed tile layer

use slotmap::new_key_type;
use std::collections::HashSet;

use super::body::Body;
use crate::core::geom::Rect;

new_key_type! {
    /// Handle to a tile layer registered with a [`World`](super::World)
    pub struct TileLayerHandle;
}

/// A tile as seen by the physics engine: its world rectangle plus which faces
/// collide and which faces are "interesting" (not hidden by a colliding
/// neighbour).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub index: i32,
    pub column: u32,
    pub row: u32,
    pub rect: Rect,
    pub collide_up: bool,
    pub collide_down: bool,
    pub collide_left: bool,
    pub collide_right: bool,
    pub face_top: bool,
    pub face_bottom: bool,
    pub face_left: bool,
    pub face_right: bool,
}

impl Tile {
    /// Tile that collides on every side with every face exposed
    pub fn solid(index: i32, column: u32, row: u32, rect: Rect) -> Self {
        Self {
            index,
            column,
            row,
            rect,
            collide_up: true,
            collide_down: true,
            collide_left: true,
            collide_right: true,
            face_top: true,
            face_bottom: true,
            face_left: true,
            face_right: true,
        }
    }

    pub fn collides(&self) -> bool {
        self.collide_up || self.collide_down || self.collide_left || self.collide_right
    }

    pub fn has_interesting_face(&self) -> bool {
        self.face_top || self.face_bottom || self.face_left || self.face_right
    }
}

/// Read-only tile lookup consumed by the world
pub trait TileLayer {
    fn tile_width(&self) -> f32;

    fn tile_height(&self) -> f32;

    /// Tiles whose rectangles overlap `area`. With `colliding_only` set,
    /// tiles that collide on no side are skipped.
    fn tiles_within(&self, area: &Rect, colliding_only: bool) -> Vec<Tile>;
}

/// Empty cell marker in [`GridLayer`] data
pub const EMPTY_TILE: i32 = -1;

/// Row-major grid of tile indexes with a set of colliding indexes
#[derive(Debug, Clone)]
pub struct GridLayer {
    origin_x: f32,
    origin_y: f32,
    columns: u32,
    rows: u32,
    tile_width: f32,
    tile_height: f32,
    data: Vec<i32>,
    colliding: HashSet<i32>,
}

impl GridLayer {
    /// Empty layer of `columns` x `rows` tiles
    pub fn new(columns: u32, rows: u32, tile_width: f32, tile_height: f32) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            columns,
            rows,
            tile_width,
            tile_height,
            data: vec![EMPTY_TILE; (columns * rows) as usize],
            colliding: HashSet::new(),
        }
    }

    /// Build from rows of indexes; short rows are padded with empty tiles
    pub fn from_rows(rows: &[Vec<i32>], tile_width: f32, tile_height: f32) -> Self {
        let columns = rows.iter().map(|row| row.len()).max().unwrap_or(0) as u32;
        let mut layer = Self::new(columns, rows.len() as u32, tile_width, tile_height);
        for (y, row) in rows.iter().enumerate() {
            for (x, index) in row.iter().enumerate() {
                layer.put_tile(x as u32, y as u32, *index);
            }
        }
        layer
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Mark tile indexes as colliding
    pub fn set_collision(&mut self, indexes: &[i32], collides: bool) {
        for index in indexes {
            if collides {
                self.colliding.insert(*index);
            } else {
                self.colliding.remove(index);
            }
        }
    }

    /// Mark every index in `start..=stop` as colliding
    pub fn set_collision_between(&mut self, start: i32, stop: i32, collides: bool) {
        let indexes: Vec<i32> = (start..=stop).collect();
        self.set_collision(&indexes, collides);
    }

    pub fn put_tile(&mut self, column: u32, row: u32, index: i32) {
        if column < self.columns && row < self.rows {
            self.data[(row * self.columns + column) as usize] = index;
        }
    }

    pub fn index_at(&self, column: i64, row: i64) -> i32 {
        if column < 0 || row < 0 || column >= self.columns as i64 || row >= self.rows as i64 {
            return EMPTY_TILE;
        }
        self.data[(row as u32 * self.columns + column as u32) as usize]
    }

    fn is_colliding(&self, column: i64, row: i64) -> bool {
        let index = self.index_at(column, row);
        index != EMPTY_TILE && self.colliding.contains(&index)
    }

    fn tile_at(&self, column: u32, row: u32) -> Tile {
        let index = self.index_at(column as i64, row as i64);
        let rect = Rect::new(
            self.origin_x + column as f32 * self.tile_width,
            self.origin_y + row as f32 * self.tile_height,
            self.tile_width,
            self.tile_height,
        );
        let (c, r) = (column as i64, row as i64);
        let collides = self.is_colliding(c, r);

        Tile {
            index,
            column,
            row,
            rect,
            collide_up: collides,
            collide_down: collides,
            collide_left: collides,
            collide_right: collides,
            face_top: collides && !self.is_colliding(c, r - 1),
            face_bottom: collides && !self.is_colliding(c, r + 1),
            face_left: collides && !self.is_colliding(c - 1, r),
            face_right: collides && !self.is_colliding(c + 1, r),
        }
    }
}

impl TileLayer for GridLayer {
    fn tile_width(&self) -> f32 {
        self.tile_width
    }

    fn tile_height(&self) -> f32 {
        self.tile_height
    }

    fn tiles_within(&self, area: &Rect, colliding_only: bool) -> Vec<Tile> {
        if !area.is_valid() || self.tile_width <= 0.0 || self.tile_height <= 0.0 {
            return Vec::new();
        }

        let first_column =
            ((area.left() - self.origin_x) / self.tile_width).floor().max(0.0) as u32;
        let first_row = ((area.top() - self.origin_y) / self.tile_height).floor().max(0.0) as u32;
        let end_column = (((area.right() - self.origin_x) / self.tile_width).ceil().max(0.0) as u32)
            .min(self.columns);
        let end_row = (((area.bottom() - self.origin_y) / self.tile_height).ceil().max(0.0) as u32)
            .min(self.rows);

        let mut tiles = Vec::new();
        for row in first_row..end_row {
            for column in first_column..end_column {
                let tile = self.tile_at(column, row);
                if tile.index == EMPTY_TILE || (colliding_only && !tile.collides()) {
                    continue;
                }
                tiles.push(tile);
            }
        }
        tiles
    }
}

/// Strict overlap between a tile rectangle and a body
pub fn tile_intersects_body(tile: &Rect, body: &Body) -> bool {
    !(body.right() <= tile.left()
        || body.bottom() <= tile.top()
        || body.left() >= tile.right()
        || body.top() >= tile.bottom())
}

/// Separate a body from one tile. `is_layer` is false for loose tiles that
/// did not come from a layer query; those collide on every face.
pub(crate) fn separate_tile(body: &mut Body, tile: &Tile, tile_bias: f32, is_layer: bool) -> bool {
    // an earlier tile this step may already have pushed the body clear
    if !body.enable || !tile_intersects_body(&tile.rect, body) {
        return false;
    }

    let (face_horizontal, face_vertical) = if is_layer {
        (
            tile.face_left || tile.face_right,
            tile.face_top || tile.face_bottom,
        )
    } else {
        (true, true)
    };

    if !face_horizontal && !face_vertical {
        return false;
    }

    let rect = tile.rect;
    let mut min_x = 0.0;
    let mut min_y = 1.0;

    if body.delta_abs_x() > body.delta_abs_y() {
        min_x = -1.0;
    } else if body.delta_abs_x() < body.delta_abs_y() {
        min_y = -1.0;
    }

    if body.delta_x() != 0.0 && body.delta_y() != 0.0 && face_horizontal && face_vertical {
        // moving diagonally into a corner: resolve the shallower axis first
        min_x = (body.left() - rect.right()).abs().min((body.right() - rect.left()).abs());
        min_y = (body.top() - rect.bottom()).abs().min((body.bottom() - rect.top()).abs());
    }

    let mut ox = 0.0;
    let mut oy = 0.0;

    if min_x < min_y {
        if face_horizontal {
            ox = tile_check_x(body, tile, tile_bias, is_layer);
            if ox != 0.0 && !tile_intersects_body(&rect, body) {
                return true;
            }
        }
        if face_vertical {
            oy = tile_check_y(body, tile, tile_bias, is_layer);
        }
    } else {
        if face_vertical {
            oy = tile_check_y(body, tile, tile_bias, is_layer);
            if oy != 0.0 && !tile_intersects_body(&rect, body) {
                return true;
            }
        }
        if face_horizontal {
            ox = tile_check_x(body, tile, tile_bias, is_layer);
        }
    }

    ox != 0.0 || oy != 0.0
}

fn tile_check_x(body: &mut Body, tile: &Tile, tile_bias: f32, is_layer: bool) -> f32 {
    let (face_left, face_right, collide_left, collide_right) = if is_layer {
        (tile.face_left, tile.face_right, tile.collide_left, tile.collide_right)
    } else {
        (true, true, true, true)
    };
    let rect = tile.rect;
    let mut ox = 0.0;

    if body.delta_x() < 0.0 && collide_right && body.check_collision.left {
        if face_right && body.left() < rect.right() {
            ox = body.left() - rect.right();
            if ox < -tile_bias {
                ox = 0.0;
            }
        }
    } else if body.delta_x() > 0.0 && collide_left && body.check_collision.right {
        if face_left && body.right() > rect.left() {
            ox = body.right() - rect.left();
            if ox > tile_bias {
                ox = 0.0;
            }
        }
    }

    if ox != 0.0 {
        if body.custom_separate_x {
            body.overlap_x = ox;
        } else {
            process_tile_separation_x(body, ox);
        }
    }
    ox
}

fn tile_check_y(body: &mut Body, tile: &Tile, tile_bias: f32, is_layer: bool) -> f32 {
    let (face_top, face_bottom, collide_up, collide_down) = if is_layer {
        (tile.face_top, tile.face_bottom, tile.collide_up, tile.collide_down)
    } else {
        (true, true, true, true)
    };
    let rect = tile.rect;
    let mut oy = 0.0;

    if body.delta_y() < 0.0 && collide_down && body.check_collision.up {
        if face_bottom && body.top() < rect.bottom() {
            oy = body.top() - rect.bottom();
            if oy < -tile_bias {
                oy = 0.0;
            }
        }
    } else if body.delta_y() > 0.0 && collide_up && body.check_collision.down {
        if face_top && body.bottom() > rect.top() {
            oy = body.bottom() - rect.top();
            if oy > tile_bias {
                oy = 0.0;
            }
        }
    }

    if oy != 0.0 {
        if body.custom_separate_y {
            body.overlap_y = oy;
        } else {
            process_tile_separation_y(body, oy);
        }
    }
    oy
}

fn process_tile_separation_x(body: &mut Body, x: f32) {
    if x < 0.0 {
        body.blocked.left = true;
    } else if x > 0.0 {
        body.blocked.right = true;
    }

    body.position.x -= x;
    body.refresh_delta();

    body.velocity.x = if body.bounce.x == 0.0 {
        0.0
    } else {
        -body.velocity.x * body.bounce.x
    };
}

fn process_tile_separation_y(body: &mut Body, y: f32) {
    if y < 0.0 {
        body.blocked.up = true;
    } else if y > 0.0 {
        body.blocked.down = true;
    }

    body.position.y -= y;
    body.refresh_delta();

    body.velocity.y = if body.bounce.y == 0.0 {
        0.0
    } else {
        -body.velocity.y * body.bounce.y
    };
}
