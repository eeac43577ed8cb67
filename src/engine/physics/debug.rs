// Debug overlay geometry for physics bodies

use glam::Vec2;

use super::body::Body;
use super::config::{DebugColors, WorldConfig};

/// Segments used to approximate a circle outline
const CIRCLE_SEGMENTS: u32 = 16;

/// Velocity lines are drawn at this fraction of the velocity
const VELOCITY_SCALE: f32 = 0.5;

/// Line-list vertex, laid out for direct GPU upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Builds line-list geometry for body outlines and velocities.
/// Rendering is left to whoever owns the GPU; this only produces buffers.
#[derive(Debug, Default)]
pub struct DebugRenderer {
    vertices: Vec<DebugVertex>,
    indices: Vec<u32>,
    enabled: bool,
}

impl DebugRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug geometry
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertices(&self) -> &[DebugVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex data as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn line_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// Rebuild the geometry for every enabled body
    pub fn prepare<'a>(
        &mut self,
        bodies: impl IntoIterator<Item = &'a Body>,
        config: &WorldConfig,
    ) {
        self.clear();
        if !self.enabled {
            return;
        }

        for body in bodies {
            if !body.enable {
                continue;
            }
            let show_kind = if body.is_static() {
                config.debug_show_static_body
            } else {
                config.debug_show_body
            };
            if show_kind && body.debug_show_body {
                self.draw_body(body, &config.debug_colors);
            }
            if config.debug_show_velocity && body.debug_show_velocity && !body.is_static() {
                self.draw_velocity(body, &config.debug_colors);
            }
        }
    }

    /// Outline a body. Box edges take the blocked colours when blocked on
    /// that side; edges that do not collide are skipped.
    pub fn draw_body(&mut self, body: &Body, colors: &DebugColors) {
        let base = body.debug_body_color.unwrap_or(if body.is_static() {
            colors.static_body
        } else {
            colors.body
        });

        if body.is_circle() {
            self.draw_circle(body.center(), body.radius(), rgba(base));
            return;
        }

        let (left, top, right, bottom) = (body.left(), body.top(), body.right(), body.bottom());
        let edge_color = |blocked: bool, world_blocked: bool| {
            if world_blocked {
                rgba(colors.world_blocked)
            } else if blocked {
                rgba(colors.blocked)
            } else {
                rgba(base)
            }
        };

        let check = body.check_collision;
        if check.up {
            let color = edge_color(body.blocked.up, body.world_blocked.up);
            self.draw_line(Vec2::new(left, top), Vec2::new(right, top), color);
        }
        if check.right {
            let color = edge_color(body.blocked.right, body.world_blocked.right);
            self.draw_line(Vec2::new(right, top), Vec2::new(right, bottom), color);
        }
        if check.down {
            let color = edge_color(body.blocked.down, body.world_blocked.down);
            self.draw_line(Vec2::new(right, bottom), Vec2::new(left, bottom), color);
        }
        if check.left {
            let color = edge_color(body.blocked.left, body.world_blocked.left);
            self.draw_line(Vec2::new(left, bottom), Vec2::new(left, top), color);
        }
    }

    pub fn draw_velocity(&mut self, body: &Body, colors: &DebugColors) {
        let center = body.center();
        let tip = center + body.velocity * VELOCITY_SCALE;
        if tip.is_finite() && tip != center {
            self.draw_line(center, tip, rgba(colors.velocity));
        }
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: [f32; 4]) {
        let start_idx = self.vertices.len() as u32;
        self.vertices.push(DebugVertex {
            position: from.to_array(),
            color,
        });
        self.vertices.push(DebugVertex {
            position: to.to_array(),
            color,
        });
        self.indices.push(start_idx);
        self.indices.push(start_idx + 1);
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        let start_idx = self.vertices.len() as u32;

        for i in 0..CIRCLE_SEGMENTS {
            let angle = (i as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
            let point = center + Vec2::new(angle.cos(), angle.sin()) * radius;

            self.vertices.push(DebugVertex {
                position: point.to_array(),
                color,
            });

            let next = (i + 1) % CIRCLE_SEGMENTS;
            self.indices.push(start_idx + i);
            self.indices.push(start_idx + next);
        }
    }
}

/// 0xRRGGBB to normalized RGBA
fn rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}
