use crate::surface::{PixelBuffer, Surface};
use std::borrow::Cow;
use wgpu::PipelineCompilationOptions;

/// Uploads the CPU pixel buffer into a texture and stretches it over the
/// window with a single fullscreen triangle.
pub struct Render {
  frame_texture: wgpu::Texture,
  frame_bind_group: wgpu::BindGroup,
  render_pipeline: wgpu::RenderPipeline,
  frame_size: wgpu::Extent3d,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    frame_width: u32,
    frame_height: u32,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("blit"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/blit.wgsl"))),
    });

    let frame_size = wgpu::Extent3d {
      width: frame_width,
      height: frame_height,
      depth_or_array_layers: 1,
    };
    let frame_texture = device.create_texture(&wgpu::TextureDescriptor {
      label: Some("Frame Texture"),
      size: frame_size,
      mip_level_count: 1,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      // the pixel buffer holds sRGB colors, matching the srgb view of the surface
      format: wgpu::TextureFormat::Rgba8UnormSrgb,
      usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
      view_formats: &[],
    });
    let frame_view = frame_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let frame_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some("Frame Sampler"),
      mag_filter: wgpu::FilterMode::Nearest,
      min_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });

    let frame_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
          wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
              sample_type: wgpu::TextureSampleType::Float { filterable: true },
              view_dimension: wgpu::TextureViewDimension::D2,
              multisampled: false,
            },
            count: None,
          },
          wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
          },
        ],
        label: Some("frame_bind_group_layout"),
      });
    let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &frame_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: wgpu::BindingResource::TextureView(&frame_view),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: wgpu::BindingResource::Sampler(&frame_sampler),
        },
      ],
      label: Some("frame_bind_group"),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[&frame_bind_group_layout],
      push_constant_ranges: &[],
    });
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(config.view_formats[0].into())],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    Render {
      frame_texture,
      frame_bind_group,
      render_pipeline,
      frame_size,
    }
  }

  /// Copies `frame` into the texture if it was committed since the last
  /// upload.
  pub fn upload(&self, queue: &wgpu::Queue, frame: &mut PixelBuffer) {
    if !frame.take_committed() {
      return;
    }
    debug_assert_eq!(frame.width(), self.frame_size.width);
    queue.write_texture(
      wgpu::ImageCopyTexture {
        texture: &self.frame_texture,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
      },
      frame.as_bytes(),
      wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(4 * self.frame_size.width),
        rows_per_image: Some(self.frame_size.height),
      },
      self.frame_size,
    );
  }

  pub fn render(&self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, &self.frame_bind_group, &[]);
      rpass.draw(0..3, 0..1);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
