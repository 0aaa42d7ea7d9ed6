//! The single-quad 2D pipeline
//!
//! Every UI element on screen is a textured or flat-colored quad (plus the
//! occasional line and triangle) drawn through one shader pair. Positions
//! are in pixels; the vertex shader maps them to clip space off a
//! `screenSize` uniform and flips Y so the origin is top-left. A frame-wide
//! alpha multiplier implements the fade contract: one value scales every
//! draw in the frame.

use crate::{RenderError, Result};
use glow::HasContext;
use tracing::debug;

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 uv;
uniform vec2 screenSize;
out vec2 v_uv;
void main() {
    vec2 ndc = (position / screenSize) * 2.0 - 1.0;
    gl_Position = vec4(ndc.x, -ndc.y, 0.0, 1.0);
    v_uv = uv;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D tex;
uniform vec4 color;
uniform bool useTexture;
out vec4 fragColor;
void main() {
    if (useTexture) {
        vec4 t = texture(tex, v_uv);
        fragColor = vec4(t.rgb * color.rgb, t.a * color.a);
    } else {
        fragColor = color;
    }
}
"#;

/// RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// Opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color with an explicit alpha.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// This color with its alpha scaled.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: self.a * alpha,
            ..self
        }
    }
}

struct Pipeline {
    program: glow::NativeProgram,
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
    u_screen_size: Option<glow::NativeUniformLocation>,
    u_color: Option<glow::NativeUniformLocation>,
    u_use_texture: Option<glow::NativeUniformLocation>,
}

/// The 2D renderer
pub struct Draw2d {
    pipeline: Option<Pipeline>,
    screen_size: (f32, f32),
    /// Frame-wide alpha multiplier (the fade)
    alpha: f32,
}

impl Default for Draw2d {
    fn default() -> Self {
        Self::new()
    }
}

impl Draw2d {
    /// Create with no GL resources; everything is built on first use.
    pub fn new() -> Self {
        Self {
            pipeline: None,
            screen_size: (1.0, 1.0),
            alpha: 1.0,
        }
    }

    /// Forget all GL handles. The context they belonged to is gone.
    pub fn reset_gl(&mut self) {
        debug!("Draw2d: forgetting GL handles");
        self.pipeline = None;
    }

    /// Set the frame-wide alpha multiplier applied to every draw.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Current frame-wide alpha.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Bind the pipeline for a new frame at the given resolution.
    pub fn begin_frame(&mut self, gl: &glow::Context, width: u32, height: u32) -> Result<()> {
        self.screen_size = (width as f32, height as f32);
        self.alpha = 1.0;
        self.ensure_pipeline(gl)?;

        let pipeline = self.pipeline.as_ref().expect("pipeline just ensured");
        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            gl.use_program(Some(pipeline.program));
            gl.uniform_2_f32(
                pipeline.u_screen_size.as_ref(),
                self.screen_size.0,
                self.screen_size.1,
            );
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            // Dithering smears thin glyph edges.
            gl.disable(glow::DITHER);
        }
        Ok(())
    }

    /// Clear the whole target.
    pub fn clear(&self, gl: &glow::Context, color: Color) {
        unsafe {
            gl.clear_color(color.r, color.g, color.b, color.a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Flat-colored axis-aligned rectangle.
    pub fn fill_rect(
        &mut self,
        gl: &glow::Context,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    ) {
        let verts = quad_vertices(x, y, w, h, 0.0, 0.0, 1.0, 1.0);
        self.submit(gl, &verts, glow::TRIANGLES, None, color);
    }

    /// Textured quad sampling the full texture.
    pub fn textured_rect(
        &mut self,
        gl: &glow::Context,
        texture: glow::NativeTexture,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    ) {
        let verts = quad_vertices(x, y, w, h, 0.0, 0.0, 1.0, 1.0);
        self.submit(gl, &verts, glow::TRIANGLES, Some(texture), color);
    }

    /// Textured quad with explicit UV rectangle.
    #[allow(clippy::too_many_arguments)]
    pub fn textured_rect_uv(
        &mut self,
        gl: &glow::Context,
        texture: glow::NativeTexture,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv: [f32; 4],
        color: Color,
    ) {
        let verts = quad_vertices(x, y, w, h, uv[0], uv[1], uv[2], uv[3]);
        self.submit(gl, &verts, glow::TRIANGLES, Some(texture), color);
    }

    /// Single line segment, one pixel wide.
    pub fn line(&mut self, gl: &glow::Context, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
        let verts = [x0, y0, 0.0, 0.0, x1, y1, 1.0, 1.0];
        self.submit(gl, &verts, glow::LINES, None, color);
    }

    /// Flat-colored triangle.
    #[allow(clippy::too_many_arguments)]
    pub fn triangle(
        &mut self,
        gl: &glow::Context,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    ) {
        let verts = [x0, y0, 0.0, 0.0, x1, y1, 0.5, 1.0, x2, y2, 1.0, 0.0];
        self.submit(gl, &verts, glow::TRIANGLES, None, color);
    }

    /// Rotated filled square centered at (cx, cy); the loading spinner.
    pub fn rotated_square(
        &mut self,
        gl: &glow::Context,
        cx: f32,
        cy: f32,
        half: f32,
        angle: f32,
        color: Color,
    ) {
        let (sin, cos) = angle.sin_cos();
        let corner = |dx: f32, dy: f32| {
            (
                cx + dx * cos - dy * sin,
                cy + dx * sin + dy * cos,
            )
        };
        let (ax, ay) = corner(-half, -half);
        let (bx, by) = corner(half, -half);
        let (cx2, cy2) = corner(half, half);
        let (dx, dy) = corner(-half, half);
        let verts = [
            ax, ay, 0.0, 0.0, bx, by, 1.0, 0.0, cx2, cy2, 1.0, 1.0, //
            ax, ay, 0.0, 0.0, cx2, cy2, 1.0, 1.0, dx, dy, 0.0, 1.0,
        ];
        self.submit(gl, &verts, glow::TRIANGLES, None, color);
    }

    fn submit(
        &mut self,
        gl: &glow::Context,
        vertices: &[f32],
        mode: u32,
        texture: Option<glow::NativeTexture>,
        color: Color,
    ) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };
        let color = color.with_alpha(self.alpha);

        unsafe {
            gl.use_program(Some(pipeline.program));
            gl.bind_vertex_array(Some(pipeline.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(pipeline.vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STREAM_DRAW,
            );

            gl.uniform_4_f32(
                pipeline.u_color.as_ref(),
                color.r,
                color.g,
                color.b,
                color.a,
            );
            gl.uniform_1_i32(
                pipeline.u_use_texture.as_ref(),
                i32::from(texture.is_some()),
            );
            if let Some(texture) = texture {
                gl.active_texture(glow::TEXTURE0);
                gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            }

            gl.draw_arrays(mode, 0, (vertices.len() / 4) as i32);
            gl.bind_vertex_array(None);
        }
    }

    fn ensure_pipeline(&mut self, gl: &glow::Context) -> Result<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }

        let program = compile_program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(RenderError::Gl)?;
            let vbo = gl.create_buffer().map_err(RenderError::Gl)?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            let stride = 4 * std::mem::size_of::<f32>() as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 8);
            gl.bind_vertex_array(None);

            let u_screen_size = gl.get_uniform_location(program, "screenSize");
            let u_color = gl.get_uniform_location(program, "color");
            let u_use_texture = gl.get_uniform_location(program, "useTexture");

            // The sampler always reads unit 0.
            gl.use_program(Some(program));
            let u_tex = gl.get_uniform_location(program, "tex");
            gl.uniform_1_i32(u_tex.as_ref(), 0);

            self.pipeline = Some(Pipeline {
                program,
                vao,
                vbo,
                u_screen_size,
                u_color,
                u_use_texture,
            });
        }
        debug!("Draw2d pipeline built");
        Ok(())
    }
}

/// Six vertices (two triangles) for an axis-aligned quad.
fn quad_vertices(x: f32, y: f32, w: f32, h: f32, u0: f32, v0: f32, u1: f32, v1: f32) -> [f32; 24] {
    [
        x, y, u0, v0, //
        x + w, y, u1, v0, //
        x + w, y + h, u1, v1, //
        x, y, u0, v0, //
        x + w, y + h, u1, v1, //
        x, y + h, u0, v1,
    ]
}

/// Compile and link a program; shared by the CRT and video pipelines.
pub(crate) fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::NativeProgram> {
    unsafe {
        let program = gl.create_program().map_err(RenderError::Gl)?;

        let mut shaders = Vec::with_capacity(2);
        for (kind, src) in [
            (glow::VERTEX_SHADER, vertex_src),
            (glow::FRAGMENT_SHADER, fragment_src),
        ] {
            let shader = gl.create_shader(kind).map_err(RenderError::Gl)?;
            gl.shader_source(shader, src);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(RenderError::Gl(format!("shader compile: {log}")));
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }

        gl.link_program(program);
        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(RenderError::Gl(format!("program link: {log}")));
        }

        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertices_cover_rect() {
        let v = quad_vertices(10.0, 20.0, 100.0, 50.0, 0.0, 0.0, 1.0, 1.0);
        // Six vertices, four floats each.
        assert_eq!(v.len(), 24);
        // Last vertex is the bottom-left corner.
        assert_eq!(&v[20..22], &[10.0, 70.0]);
    }

    #[test]
    fn alpha_multiplier_scales_colors() {
        let mut draw = Draw2d::new();
        draw.set_alpha(0.5);
        let color = Color::rgba(1.0, 1.0, 1.0, 0.8).with_alpha(draw.alpha());
        assert!((color.a - 0.4).abs() < 1e-6);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut draw = Draw2d::new();
        draw.set_alpha(3.0);
        assert_eq!(draw.alpha(), 1.0);
        draw.set_alpha(-1.0);
        assert_eq!(draw.alpha(), 0.0);
    }

    #[test]
    fn reset_forgets_pipeline() {
        let mut draw = Draw2d::new();
        draw.reset_gl();
        assert!(draw.pipeline.is_none());
    }
}
