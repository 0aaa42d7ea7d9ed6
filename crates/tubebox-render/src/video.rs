//! Decoded-frame upload and presentation
//!
//! Frames arrive as RGBA, planar I420 or semi-planar NV12; each layout gets
//! its own fragment shader (the YUV ones convert BT.601 limited range in the
//! shader, so no CPU conversion ever happens). Plane uploads honor the
//! decoder's stride via UNPACK_ROW_LENGTH.

use crate::draw2d::compile_program;
use crate::surface::Viewport;
use crate::{RenderError, Result};
use glow::HasContext;
use tracing::debug;
use tubebox_media::{PixelLayout, VideoFrame};

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

const FRAGMENT_RGBA: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D texY;
uniform float alpha;
out vec4 fragColor;
void main() {
    fragColor = vec4(texture(texY, v_uv).rgb, alpha);
}
"#;

const BT601: &str = r#"
vec3 bt601(float y, float u, float v) {
    y = (y - 0.0625) * 1.164;
    u -= 0.5;
    v -= 0.5;
    return vec3(
        y + 1.596 * v,
        y - 0.392 * u - 0.813 * v,
        y + 2.017 * u
    );
}
"#;

const FRAGMENT_I420_BODY: &str = r#"
in vec2 v_uv;
uniform sampler2D texY;
uniform sampler2D texU;
uniform sampler2D texV;
uniform float alpha;
out vec4 fragColor;
void main() {
    float y = texture(texY, v_uv).r;
    float u = texture(texU, v_uv).r;
    float v = texture(texV, v_uv).r;
    fragColor = vec4(clamp(bt601(y, u, v), 0.0, 1.0), alpha);
}
"#;

const FRAGMENT_NV12_BODY: &str = r#"
in vec2 v_uv;
uniform sampler2D texY;
uniform sampler2D texU;
uniform float alpha;
out vec4 fragColor;
void main() {
    float y = texture(texY, v_uv).r;
    vec2 uv = texture(texU, v_uv).rg;
    fragColor = vec4(clamp(bt601(y, uv.x, uv.y), 0.0, 1.0), alpha);
}
"#;

struct Pipeline {
    program: glow::NativeProgram,
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

/// Uploads decoded frames and draws the most recent one
pub struct VideoTextures {
    pipelines: [Option<Pipeline>; 3],
    planes: [Option<glow::NativeTexture>; 3],
    frame_size: (u32, u32),
    layout: Option<PixelLayout>,
}

impl Default for VideoTextures {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoTextures {
    /// Create with no GL resources.
    pub fn new() -> Self {
        Self {
            pipelines: [None, None, None],
            planes: [None, None, None],
            frame_size: (0, 0),
            layout: None,
        }
    }

    /// Forget all GL handles after a handoff.
    pub fn reset_gl(&mut self) {
        debug!("VideoTextures: forgetting GL handles");
        self.pipelines = [None, None, None];
        self.planes = [None, None, None];
        self.layout = None;
        self.frame_size = (0, 0);
    }

    /// Drop the current frame (playback stopped).
    pub fn clear(&mut self) {
        self.layout = None;
    }

    /// Whether a frame has been uploaded and can be drawn.
    pub fn has_frame(&self) -> bool {
        self.layout.is_some()
    }

    /// Source resolution of the current frame.
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// Upload a decoded frame, stride-aware per plane.
    pub fn upload(&mut self, gl: &glow::Context, frame: &VideoFrame) {
        if !frame.is_well_formed() {
            debug!("Dropping malformed frame");
            return;
        }

        let (w, h) = (frame.width, frame.height);
        let plane_descs: &[(u32, u32, u32, u32)] = match frame.layout {
            // (internal format, format, plane width, plane height) per plane
            PixelLayout::Rgba => &[(glow::RGBA8, glow::RGBA, 0, 0)],
            PixelLayout::I420 => &[
                (glow::R8, glow::RED, 0, 0),
                (glow::R8, glow::RED, 1, 1),
                (glow::R8, glow::RED, 1, 1),
            ],
            PixelLayout::Nv12 => &[(glow::R8, glow::RED, 0, 0), (glow::RG8, glow::RG, 1, 1)],
        };

        unsafe {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            for (i, (internal, format, shift_w, shift_h)) in plane_descs.iter().enumerate() {
                let plane_w = w >> shift_w;
                let plane_h = h >> shift_h;
                let bytes_per_pixel: u32 = match *format {
                    glow::RGBA => 4,
                    glow::RG => 2,
                    _ => 1,
                };
                let stride_pixels = frame.strides[i] as u32 / bytes_per_pixel;
                gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, stride_pixels as i32);

                let texture = match self.planes[i] {
                    Some(t) => t,
                    None => {
                        let t = match gl.create_texture() {
                            Ok(t) => t,
                            Err(e) => {
                                debug!("Texture alloc failed: {}", e);
                                return;
                            }
                        };
                        self.planes[i] = Some(t);
                        t
                    }
                };

                gl.bind_texture(glow::TEXTURE_2D, Some(texture));
                gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_MIN_FILTER,
                    glow::LINEAR as i32,
                );
                gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_MAG_FILTER,
                    glow::LINEAR as i32,
                );
                gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_WRAP_S,
                    glow::CLAMP_TO_EDGE as i32,
                );
                gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_WRAP_T,
                    glow::CLAMP_TO_EDGE as i32,
                );
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    *internal as i32,
                    plane_w as i32,
                    plane_h as i32,
                    0,
                    *format,
                    glow::UNSIGNED_BYTE,
                    glow::PixelUnpackData::Slice(Some(&frame.planes[i])),
                );
            }

            gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, 0);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        self.frame_size = (w, h);
        self.layout = Some(frame.layout);
    }

    /// Draw the current frame into `dst`. A no-op when nothing is uploaded.
    pub fn draw(
        &mut self,
        gl: &glow::Context,
        dst: Viewport,
        screen: (u32, u32),
        alpha: f32,
    ) -> Result<()> {
        let Some(layout) = self.layout else {
            return Ok(());
        };

        let index = pipeline_index(layout);
        if self.pipelines[index].is_none() {
            self.pipelines[index] = Some(build_pipeline(gl, layout)?);
        }
        let pipeline = self.pipelines[index].as_ref().expect("just built");

        let (x, y, w, h) = (dst.x as f32, dst.y as f32, dst.width as f32, dst.height as f32);
        let verts: [f32; 24] = [
            x, y, 0.0, 0.0, //
            x + w, y, 1.0, 0.0, //
            x + w, y + h, 1.0, 1.0, //
            x, y, 0.0, 0.0, //
            x + w, y + h, 1.0, 1.0, //
            x, y + h, 0.0, 1.0,
        ];

        unsafe {
            gl.use_program(Some(pipeline.program));
            gl.bind_vertex_array(Some(pipeline.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(pipeline.vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&verts),
                glow::STREAM_DRAW,
            );

            let loc = gl.get_uniform_location(pipeline.program, "screenSize");
            gl.uniform_2_f32(loc.as_ref(), screen.0 as f32, screen.1 as f32);
            let loc = gl.get_uniform_location(pipeline.program, "alpha");
            gl.uniform_1_f32(loc.as_ref(), alpha.clamp(0.0, 1.0));

            for (unit, name) in ["texY", "texU", "texV"].iter().enumerate() {
                if unit < layout.plane_count() {
                    if let Some(texture) = self.planes[unit] {
                        gl.active_texture(glow::TEXTURE0 + unit as u32);
                        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
                        let loc = gl.get_uniform_location(pipeline.program, name);
                        gl.uniform_1_i32(loc.as_ref(), unit as i32);
                    }
                }
            }
            gl.active_texture(glow::TEXTURE0);

            gl.draw_arrays(glow::TRIANGLES, 0, 6);
            gl.bind_vertex_array(None);
        }
        Ok(())
    }
}

fn pipeline_index(layout: PixelLayout) -> usize {
    match layout {
        PixelLayout::Rgba => 0,
        PixelLayout::I420 => 1,
        PixelLayout::Nv12 => 2,
    }
}

fn build_pipeline(gl: &glow::Context, layout: PixelLayout) -> Result<Pipeline> {
    let fragment = match layout {
        PixelLayout::Rgba => FRAGMENT_RGBA.to_string(),
        PixelLayout::I420 => format!(
            "#version 300 es\nprecision mediump float;\n{BT601}{FRAGMENT_I420_BODY}"
        ),
        PixelLayout::Nv12 => format!(
            "#version 300 es\nprecision mediump float;\n{BT601}{FRAGMENT_NV12_BODY}"
        ),
    };
    let program = compile_program(gl, VERTEX_SHADER, &fragment)?;

    unsafe {
        let vao = gl.create_vertex_array().map_err(RenderError::Gl)?;
        let vbo = gl.create_buffer().map_err(RenderError::Gl)?;
        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        let stride = 4 * std::mem::size_of::<f32>() as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 8);
        gl.bind_vertex_array(None);

        Ok(Pipeline { program, vao, vbo })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_layout_has_its_own_pipeline_slot() {
        assert_eq!(pipeline_index(PixelLayout::Rgba), 0);
        assert_eq!(pipeline_index(PixelLayout::I420), 1);
        assert_eq!(pipeline_index(PixelLayout::Nv12), 2);
    }

    #[test]
    fn new_has_no_frame() {
        let textures = VideoTextures::new();
        assert!(!textures.has_frame());
        assert_eq!(textures.frame_size(), (0, 0));
    }

    #[test]
    fn clear_drops_the_frame_flag() {
        let mut textures = VideoTextures::new();
        textures.layout = Some(PixelLayout::Rgba);
        textures.clear();
        assert!(!textures.has_frame());
    }
}
