//! Off-screen render targets
//!
//! A framebuffer's attachment list (count, order, formats) is fixed when it
//! is created. Resizing reallocates storage only, so attachment index 1 of
//! the editor target is the integer pick attachment for its whole life.

use serde::{Deserialize, Serialize};

use crate::foundation::collections::FramebufferHandle;
use crate::render::api::{RenderCommand, TextureBinding};
use crate::render::{RenderError, RenderResult};

/// Largest width or height a framebuffer may be resized to
pub const MAX_FRAMEBUFFER_SIZE: u32 = 8192;

/// Storage format of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FramebufferTextureFormat {
    /// 8-bit RGBA color
    Rgba8,
    /// Single-channel signed integer (pick ids)
    RedInteger,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
    /// Six-layer depth cube for omnidirectional shadows
    DepthCubemap,
}

impl FramebufferTextureFormat {
    /// Whether this is a depth (or depth-stencil) format
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::DepthCubemap)
    }

    /// Whether this is a color (non-integer) format
    pub fn is_color(self) -> bool {
        matches!(self, Self::Rgba8)
    }

    /// Whether this is an integer format
    pub fn is_integer(self) -> bool {
        matches!(self, Self::RedInteger)
    }
}

/// Sampling wrap mode of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Outside [0, 1] samples the border (depth 1.0 for shadow maps)
    #[default]
    ClampToBorder,
    /// Outside [0, 1] repeats the edge texel
    ClampToEdge,
    /// Tiles
    Repeat,
}

/// Format and wrap of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferAttachmentSpec {
    /// Storage format
    pub format: FramebufferTextureFormat,
    /// Wrap mode
    pub wrap: TextureWrap,
}

impl FramebufferAttachmentSpec {
    /// Attachment with the given format and wrap
    pub fn new(format: FramebufferTextureFormat, wrap: TextureWrap) -> Self {
        Self { format, wrap }
    }
}

impl From<FramebufferTextureFormat> for FramebufferAttachmentSpec {
    fn from(format: FramebufferTextureFormat) -> Self {
        Self::new(format, TextureWrap::default())
    }
}

/// Description of a framebuffer to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferSpec {
    /// Attachments in binding order
    pub attachments: Vec<FramebufferAttachmentSpec>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FramebufferSpec {
    /// Spec with the given attachments and size
    pub fn new(attachments: impl IntoIterator<Item = FramebufferAttachmentSpec>, width: u32, height: u32) -> Self {
        Self {
            attachments: attachments.into_iter().collect(),
            width,
            height,
        }
    }

    /// Color, integer id and depth-stencil, the editor viewport layout
    pub fn editor_viewport(width: u32, height: u32) -> Self {
        Self::new(
            [
                FramebufferTextureFormat::Rgba8.into(),
                FramebufferTextureFormat::RedInteger.into(),
                FramebufferTextureFormat::Depth24Stencil8.into(),
            ],
            width,
            height,
        )
    }

    /// Validate the attachment list and size
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "framebuffer size {}x{} has a zero dimension",
                self.width, self.height
            )));
        }
        if self.width > MAX_FRAMEBUFFER_SIZE || self.height > MAX_FRAMEBUFFER_SIZE {
            return Err(RenderError::ResourceCreationFailed(format!(
                "framebuffer size {}x{} exceeds {MAX_FRAMEBUFFER_SIZE}",
                self.width, self.height
            )));
        }
        if self.attachments.is_empty() {
            return Err(RenderError::ResourceCreationFailed("framebuffer has no attachments".into()));
        }
        let depth_count = self.attachments.iter().filter(|a| a.format.is_depth()).count();
        if depth_count > 1 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "framebuffer has {depth_count} depth attachments, at most one allowed"
            )));
        }
        Ok(())
    }
}

/// Draw target and viewport active before a [`Framebuffer::bind`]
#[derive(Debug, Clone, Copy)]
struct PreviousBinding {
    target: Option<FramebufferHandle>,
    viewport: (i32, i32, u32, u32),
}

/// Render target handle plus its (immutable) attachment layout
#[derive(Debug)]
pub struct Framebuffer {
    handle: FramebufferHandle,
    spec: FramebufferSpec,
    previous: Option<PreviousBinding>,
}

impl Framebuffer {
    /// Allocate a framebuffer on the device
    pub fn create(command: &mut RenderCommand, spec: FramebufferSpec) -> RenderResult<Self> {
        spec.validate()?;
        let handle = command.create_framebuffer(&spec)?;
        log::debug!(
            "Created framebuffer {}x{} with {} attachments",
            spec.width,
            spec.height,
            spec.attachments.len()
        );
        Ok(Self { handle, spec, previous: None })
    }

    /// Reallocate every attachment at a new size
    ///
    /// A zero dimension or one above [`MAX_FRAMEBUFFER_SIZE`] is rejected
    /// with a warning and leaves the framebuffer unchanged.
    pub fn resize(&mut self, command: &mut RenderCommand, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 || width > MAX_FRAMEBUFFER_SIZE || height > MAX_FRAMEBUFFER_SIZE {
            log::warn!("Attempted to resize framebuffer to {}x{}", width, height);
            return Ok(());
        }
        if (width, height) == (self.spec.width, self.spec.height) {
            return Ok(());
        }

        command.resize_framebuffer(self.handle, width, height)?;
        self.spec.width = width;
        self.spec.height = height;
        log::debug!("Resized framebuffer to {}x{}", width, height);
        Ok(())
    }

    /// Read one texel of an integer attachment, origin bottom-left
    pub fn read_pixel_int(&self, command: &RenderCommand, attachment_index: usize, x: i32, y: i32) -> RenderResult<i32> {
        let attachment = self.attachment(attachment_index)?;
        if !attachment.format.is_integer() {
            return Err(RenderError::AttachmentFormatMismatch {
                index: attachment_index,
                actual: attachment.format,
                expected: "integer",
            });
        }
        self.check_bounds(x, y)?;
        command.read_pixel_int(self.handle, attachment_index, x, y)
    }

    /// Read one texel of a color attachment, origin bottom-left
    pub fn read_pixel_rgba(&self, command: &RenderCommand, attachment_index: usize, x: i32, y: i32) -> RenderResult<[u8; 4]> {
        let attachment = self.attachment(attachment_index)?;
        if !attachment.format.is_color() {
            return Err(RenderError::AttachmentFormatMismatch {
                index: attachment_index,
                actual: attachment.format,
                expected: "color",
            });
        }
        self.check_bounds(x, y)?;
        command.read_pixel_rgba(self.handle, attachment_index, x, y)
    }

    /// Make this the draw target and set the viewport to its size
    ///
    /// The previously bound target and viewport are remembered and restored
    /// by [`unbind`](Self::unbind).
    pub fn bind(&mut self, command: &mut RenderCommand) -> RenderResult<()> {
        let previous = PreviousBinding {
            target: command.bound_framebuffer(),
            viewport: command.viewport(),
        };
        command.bind_framebuffer(Some(self.handle))?;
        command.set_viewport(0, 0, self.spec.width, self.spec.height);
        self.previous = Some(previous);
        Ok(())
    }

    /// Restore the draw target and viewport from before [`bind`](Self::bind)
    ///
    /// Without a matching bind this falls back to the default target and
    /// leaves the viewport alone.
    pub fn unbind(&mut self, command: &mut RenderCommand) -> RenderResult<()> {
        match self.previous.take() {
            Some(previous) => {
                command.bind_framebuffer(previous.target)?;
                let (x, y, width, height) = previous.viewport;
                command.set_viewport(x, y, width, height);
                Ok(())
            }
            None => command.bind_framebuffer(None),
        }
    }

    /// Bind one of this framebuffer's attachments to a texture unit
    pub fn bind_attachment_texture(&self, command: &mut RenderCommand, attachment_index: usize, unit: u32) -> RenderResult<()> {
        self.attachment(attachment_index)?;
        command.bind_texture(unit, Some(TextureBinding { framebuffer: self.handle, attachment: attachment_index }))
    }

    /// Release the device storage
    pub fn destroy(self, command: &mut RenderCommand) -> RenderResult<()> {
        command.destroy_framebuffer(self.handle)
    }

    /// Attachment index of the `n`th color attachment
    pub fn color_attachment_index(&self, n: usize) -> Option<usize> {
        self.spec
            .attachments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.format.is_color())
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Attachment index of the first attachment with the given format
    pub fn attachment_index(&self, format: FramebufferTextureFormat) -> Option<usize> {
        self.spec.attachments.iter().position(|a| a.format == format)
    }

    /// Attachment index of the first depth attachment
    pub fn depth_attachment_index(&self) -> Option<usize> {
        self.spec.attachments.iter().position(|a| a.format.is_depth())
    }

    /// Creation spec with the current size
    pub fn spec(&self) -> &FramebufferSpec {
        &self.spec
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.spec.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.spec.height
    }

    /// Device handle
    pub fn handle(&self) -> FramebufferHandle {
        self.handle
    }

    fn attachment(&self, index: usize) -> RenderResult<FramebufferAttachmentSpec> {
        self.spec
            .attachments
            .get(index)
            .copied()
            .ok_or(RenderError::AttachmentIndexOutOfRange { index, count: self.spec.attachments.len() })
    }

    fn check_bounds(&self, x: i32, y: i32) -> RenderResult<()> {
        let inside = u32::try_from(x).is_ok_and(|x| x < self.spec.width)
            && u32::try_from(y).is_ok_and(|y| y < self.spec.height);
        if inside {
            Ok(())
        } else {
            Err(RenderError::PixelOutOfBounds { x, y, width: self.spec.width, height: self.spec.height })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::SoftwareBackend;

    fn command() -> RenderCommand {
        let mut command = RenderCommand::new(Box::new(SoftwareBackend::new()));
        command.init().unwrap();
        command
    }

    #[test]
    fn test_spec_validation() {
        assert!(FramebufferSpec::editor_viewport(0, 10).validate().is_err());
        assert!(FramebufferSpec::editor_viewport(MAX_FRAMEBUFFER_SIZE + 1, 10).validate().is_err());
        assert!(FramebufferSpec::new(Vec::new(), 10, 10).validate().is_err());

        let two_depths = FramebufferSpec::new(
            [FramebufferTextureFormat::Depth24Stencil8.into(), FramebufferTextureFormat::DepthCubemap.into()],
            10,
            10,
        );
        assert!(matches!(two_depths.validate(), Err(RenderError::ResourceCreationFailed(_))));
        assert!(FramebufferSpec::editor_viewport(1280, 720).validate().is_ok());
    }

    #[test]
    fn test_attachment_lookup() {
        let mut cmd = command();
        let fb = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(4, 4)).unwrap();

        assert_eq!(fb.color_attachment_index(0), Some(0));
        assert_eq!(fb.color_attachment_index(1), None);
        assert_eq!(fb.attachment_index(FramebufferTextureFormat::RedInteger), Some(1));
        assert_eq!(fb.depth_attachment_index(), Some(2));
    }

    #[test]
    fn test_read_errors() {
        let mut cmd = command();
        let fb = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(4, 4)).unwrap();

        assert!(matches!(
            fb.read_pixel_int(&cmd, 0, 0, 0),
            Err(RenderError::AttachmentFormatMismatch { index: 0, actual: FramebufferTextureFormat::Rgba8, .. })
        ));
        assert!(matches!(
            fb.read_pixel_int(&cmd, 3, 0, 0),
            Err(RenderError::AttachmentIndexOutOfRange { index: 3, count: 3 })
        ));
        assert!(matches!(fb.read_pixel_int(&cmd, 1, -1, 0), Err(RenderError::PixelOutOfBounds { .. })));
        assert!(matches!(fb.read_pixel_rgba(&cmd, 1, 0, 0), Err(RenderError::AttachmentFormatMismatch { .. })));
        assert_eq!(fb.read_pixel_rgba(&cmd, 0, 3, 3).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_resize_is_ignored() {
        let mut cmd = command();
        let mut fb = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(4, 4)).unwrap();

        fb.resize(&mut cmd, 0, 8).unwrap();
        fb.resize(&mut cmd, 8, MAX_FRAMEBUFFER_SIZE + 1).unwrap();
        assert_eq!((fb.width(), fb.height()), (4, 4));
        assert_eq!(cmd.framebuffer_size(fb.handle()).unwrap(), (4, 4));

        fb.resize(&mut cmd, 8, 2).unwrap();
        assert_eq!(cmd.framebuffer_size(fb.handle()).unwrap(), (8, 2));
        assert_eq!(fb.read_pixel_int(&cmd, 1, 7, 1).unwrap(), 0);
    }

    #[test]
    fn test_bind_restores_previous_target() {
        let mut cmd = command();
        cmd.set_viewport(0, 0, 640, 360);
        let mut outer = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(4, 4)).unwrap();
        let mut inner = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(2, 2)).unwrap();

        outer.bind(&mut cmd).unwrap();
        inner.bind(&mut cmd).unwrap();
        assert_eq!(cmd.bound_framebuffer(), Some(inner.handle()));
        assert_eq!(cmd.backend::<SoftwareBackend>().unwrap().viewport(), (0, 0, 2, 2));

        inner.unbind(&mut cmd).unwrap();
        assert_eq!(cmd.bound_framebuffer(), Some(outer.handle()));
        assert_eq!(cmd.viewport(), (0, 0, 4, 4));
        assert_eq!(cmd.backend::<SoftwareBackend>().unwrap().viewport(), (0, 0, 4, 4));

        outer.unbind(&mut cmd).unwrap();
        assert_eq!(cmd.bound_framebuffer(), None);
        assert_eq!(cmd.viewport(), (0, 0, 640, 360));
    }

    #[test]
    fn test_attachment_texture_binding() {
        let mut cmd = command();
        let fb = Framebuffer::create(&mut cmd, FramebufferSpec::editor_viewport(4, 4)).unwrap();

        fb.bind_attachment_texture(&mut cmd, 2, 1).unwrap();
        assert!(fb.bind_attachment_texture(&mut cmd, 5, 1).is_err());
        let bound = cmd.backend::<SoftwareBackend>().unwrap().texture_unit(1);
        assert_eq!(bound, Some(TextureBinding { framebuffer: fb.handle(), attachment: 2 }));
    }
}
