use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::debug;
use waygate_shared::clip::ClipPlane;
use waygate_shared::pose::Pose;
use waygate_shared::surface::{PortalConfig, PortalId, PortalKind, PortalRegistry};
use waygate_shared::view::{solve, PortalView};

use crate::manager::RenderTargetManager;
use crate::settings::CaptureSettings;
use crate::target::{TargetAllocator, ViewportQuery};

/// Everything the external renderer needs for one portal capture pass.
#[derive(Debug)]
pub struct CaptureRequest<'a, S> {
    pub pose: Pose,
    pub projection: Mat4,
    pub surface: &'a Arc<S>,
    pub clip_plane: ClipPlane,
    pub total_reflection: bool,
}

/// The scene rasterizer behind the capture. Opaque to this subsystem.
pub trait SceneRenderer<S> {
    fn capture(&mut self, request: CaptureRequest<'_, S>);
}

pub trait ViewerQuery {
    fn viewer_position(&self) -> Vec3;
}

/// Why a frame produced no capture. None of these are errors; the next
/// frame retries from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured,
    NotConfigured,
    OwnerUnresolved,
    LinkUnresolved,
}

/// Per-portal capture component: owns the target manager and the frame
/// state, and drives the solve once per frame. Each instance is private to
/// its portal, so concurrent portals never share mutable state.
pub struct PortalSceneCapture<A: TargetAllocator> {
    owner_hint: PortalId,
    owner_resolved: bool,
    config: Option<PortalConfig>,
    clip_offset: f32,
    targets: RenderTargetManager<A>,
    clip_plane: Option<ClipPlane>,
    total_reflection: bool,
}

impl<A: TargetAllocator> PortalSceneCapture<A> {
    /// `owner` is the portal surface this capture is mounted on. It may not
    /// exist in the registry yet; resolution is retried lazily every frame.
    pub fn new(owner: PortalId, allocator: A, settings: &CaptureSettings) -> Self {
        Self {
            owner_hint: owner,
            owner_resolved: false,
            config: None,
            clip_offset: settings.clip_offset,
            targets: RenderTargetManager::new(allocator, settings.policy())
                .with_hysteresis(settings.resize_hysteresis),
            clip_plane: None,
            total_reflection: false,
        }
    }

    /// One-time setup. Weight is clamped at construction of the config; a
    /// missing link falls back to the owning portal right here, so mirror
    /// behavior is an explicit choice rather than a hidden default.
    pub fn configure(
        &mut self,
        kind: PortalKind,
        linked: Option<PortalId>,
        exit_in_front: bool,
        weight: f32,
    ) {
        let mut config = PortalConfig::new(kind, linked, exit_in_front, weight);
        if config.linked.is_none() {
            config.linked = Some(self.owner_hint);
        }
        self.config = Some(config);
    }

    pub fn set_refractive_indices(&mut self, front: f32, back: f32) {
        if let Some(config) = self.config.as_mut() {
            config.refractive_front = front;
            config.refractive_back = back;
        }
    }

    pub fn config(&self) -> Option<&PortalConfig> {
        self.config.as_ref()
    }

    /// Currently published capture surface, if bootstrapped.
    pub fn surface(&self) -> Option<&Arc<A::Surface>> {
        self.targets.surface()
    }

    /// Clip plane from the last successful solve.
    pub fn clip_plane(&self) -> Option<&ClipPlane> {
        self.clip_plane.as_ref()
    }

    /// Whether the last frame hit total internal reflection. Recomputed
    /// every frame, never sticky.
    pub fn is_total_reflection(&self) -> bool {
        self.total_reflection
    }

    fn is_owner_valid(&mut self, registry: &PortalRegistry) -> bool {
        if !self.owner_resolved {
            self.owner_resolved = registry.contains(self.owner_hint);
        }
        self.owner_resolved
    }

    /// Per-frame entry point: resolve references, size the target, solve the
    /// capture pose and hand the pass to the renderer. Unresolved references
    /// skip the frame without touching any state.
    pub fn update_per_frame<R, V, W>(
        &mut self,
        watcher: &Pose,
        projection: Mat4,
        registry: &PortalRegistry,
        viewer: &W,
        viewport: &V,
        renderer: &mut R,
    ) -> CaptureOutcome
    where
        R: SceneRenderer<A::Surface>,
        V: ViewportQuery,
        W: ViewerQuery,
    {
        let Some(config) = self.config else {
            return CaptureOutcome::NotConfigured;
        };

        if !self.is_owner_valid(registry) {
            debug!(
                owner = self.owner_hint.0,
                "portal owner not resolved yet, skipping frame"
            );
            return CaptureOutcome::OwnerUnresolved;
        }
        let Some(source) = registry.get(self.owner_hint) else {
            // Owner vanished after resolving; retry from scratch next frame.
            self.owner_resolved = false;
            return CaptureOutcome::OwnerUnresolved;
        };

        let linked = config.linked.unwrap_or(self.owner_hint);
        let Some(dest) = registry.get(linked) else {
            return CaptureOutcome::LinkUnresolved;
        };

        let distance = viewer.viewer_position().distance(source.position);
        let viewport_size = viewport.current_size();
        self.targets.ensure_bootstrapped(distance, viewport_size);
        self.targets.update_for_distance(distance, viewport_size);

        let PortalView {
            pose,
            clip_plane,
            projection,
            total_reflection,
        } = solve(watcher, &config, source, dest, projection, self.clip_offset);

        self.clip_plane = Some(clip_plane);
        self.total_reflection = total_reflection;

        let surface = self
            .targets
            .surface()
            .expect("capture target bootstrapped above");
        renderer.capture(CaptureRequest {
            pose,
            projection,
            surface,
            clip_plane,
            total_reflection,
        });
        CaptureOutcome::Captured
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use waygate_shared::pose::Pose;
    use waygate_shared::surface::{PortalId, PortalKind, PortalRegistry, PortalSurface};

    use super::{CaptureOutcome, CaptureRequest, PortalSceneCapture, SceneRenderer, ViewerQuery};
    use crate::manager::test_support::{FakeSurface, RecordingAllocator};
    use crate::settings::CaptureSettings;
    use crate::target::ViewportQuery;

    struct FixedViewport(Option<(u32, u32)>);

    impl ViewportQuery for FixedViewport {
        fn current_size(&self) -> Option<(u32, u32)> {
            self.0
        }
    }

    struct FixedViewer(Vec3);

    impl ViewerQuery for FixedViewer {
        fn viewer_position(&self) -> Vec3 {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        captures: Vec<(Pose, u32, bool)>,
    }

    impl SceneRenderer<FakeSurface> for RecordingRenderer {
        fn capture(&mut self, request: CaptureRequest<'_, FakeSurface>) {
            self.captures
                .push((request.pose, request.surface.size, request.total_reflection));
        }
    }

    fn linked_pair(registry: &mut PortalRegistry) -> (PortalId, PortalId) {
        let source = registry.insert(PortalSurface::new(Vec3::ZERO, Vec3::Z, Vec3::Y));
        let dest = registry.insert(PortalSurface::new(
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::X,
            Vec3::Y,
        ));
        (source, dest)
    }

    fn capture_for(owner: PortalId) -> PortalSceneCapture<RecordingAllocator> {
        PortalSceneCapture::new(
            owner,
            RecordingAllocator::default(),
            &CaptureSettings::default(),
        )
    }

    #[test]
    fn unconfigured_component_does_nothing() {
        let mut registry = PortalRegistry::default();
        let (source, _) = linked_pair(&mut registry);
        let mut capture = capture_for(source);
        let mut renderer = RecordingRenderer::default();

        let outcome = capture.update_per_frame(
            &Pose::IDENTITY,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::NotConfigured);
        assert!(renderer.captures.is_empty());
    }

    #[test]
    fn unresolved_owner_skips_the_frame_and_retries_later() {
        let mut registry = PortalRegistry::default();
        let dest = registry.insert(PortalSurface::new(
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::X,
            Vec3::Y,
        ));
        // The host scene graph promises this id but has not registered the
        // portal yet.
        let pending_owner = PortalId(7);

        let mut capture = capture_for(pending_owner);
        capture.configure(PortalKind::Portal, Some(dest), false, 1.0);
        let mut renderer = RecordingRenderer::default();

        let outcome = capture.update_per_frame(
            &Pose::IDENTITY,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::OwnerUnresolved);
        assert!(capture.surface().is_none());
        assert!(renderer.captures.is_empty());

        // The owner appears later; the next frame resolves it lazily.
        registry.register(
            pending_owner,
            PortalSurface::new(Vec3::ZERO, Vec3::Z, Vec3::Y),
        );
        let outcome = capture.update_per_frame(
            &Pose::IDENTITY,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::Captured);
        assert_eq!(renderer.captures.len(), 1);
    }

    #[test]
    fn unresolved_link_skips_the_solve() {
        let mut registry = PortalRegistry::default();
        let (source, dest) = linked_pair(&mut registry);
        registry.remove(dest);

        let mut capture = capture_for(source);
        capture.configure(PortalKind::Portal, Some(dest), false, 1.0);
        let mut renderer = RecordingRenderer::default();

        let outcome = capture.update_per_frame(
            &Pose::IDENTITY,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::LinkUnresolved);
        assert!(renderer.captures.is_empty());
        assert!(capture.clip_plane().is_none());
    }

    #[test]
    fn full_frame_bootstraps_solves_and_hands_off_to_the_renderer() {
        let mut registry = PortalRegistry::default();
        let (source, dest) = linked_pair(&mut registry);

        let mut capture = capture_for(source);
        capture.configure(PortalKind::Portal, Some(dest), false, 1.0);
        let mut renderer = RecordingRenderer::default();

        let watcher = Pose::from_position(Vec3::new(0.0, 0.0, 5.0));
        let outcome = capture.update_per_frame(
            &watcher,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::new(0.0, 0.0, 300.0)),
            &FixedViewport(Some((1920, 1080))),
            &mut renderer,
        );

        assert_eq!(outcome, CaptureOutcome::Captured);
        assert_eq!(renderer.captures.len(), 1);
        let (pose, size, total_reflection) = renderer.captures[0];
        assert!(pose.position.abs_diff_eq(Vec3::new(95.0, 0.0, 0.0), 1e-3));
        assert_eq!(size, 1024);
        assert!(!total_reflection);
        assert!(capture.clip_plane().is_some());
        assert!(!capture.is_total_reflection());
    }

    #[test]
    fn missing_link_defaults_to_the_owner_as_a_mirror() {
        let mut registry = PortalRegistry::default();
        let (source, _) = linked_pair(&mut registry);

        let mut capture = capture_for(source);
        capture.configure(PortalKind::Mirror, None, false, 1.0);
        assert_eq!(capture.config().unwrap().linked, Some(source));

        let mut renderer = RecordingRenderer::default();
        let watcher = Pose::from_position(Vec3::new(0.0, 0.0, 5.0));
        let outcome = capture.update_per_frame(
            &watcher,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::Captured);
        // Mirror virtual camera sits behind the plane.
        let (pose, _, _) = renderer.captures[0];
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-3));
    }

    #[test]
    fn total_reflection_is_reported_per_frame() {
        let mut registry = PortalRegistry::default();
        let (source, dest) = linked_pair(&mut registry);

        let mut capture = capture_for(source);
        capture.configure(PortalKind::Portal, Some(dest), false, 1.0);
        capture.set_refractive_indices(1.5, 1.0);
        let mut renderer = RecordingRenderer::default();

        // Grazing watcher, far past the critical angle.
        let grazing = Pose::from_position(Vec3::new(10.0, 0.0, 1.0));
        let outcome = capture.update_per_frame(
            &grazing,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(outcome, CaptureOutcome::Captured);
        assert!(capture.is_total_reflection());

        // A head-on watcher the next frame clears the flag.
        let head_on = Pose::from_position(Vec3::new(0.0, 0.1, 5.0));
        capture.update_per_frame(
            &head_on,
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::ZERO),
            &FixedViewport(None),
            &mut renderer,
        );
        assert!(!capture.is_total_reflection());
    }

    #[test]
    fn receding_viewer_republishes_a_smaller_surface() {
        let mut registry = PortalRegistry::default();
        let (source, dest) = linked_pair(&mut registry);

        let mut capture = capture_for(source);
        capture.configure(PortalKind::Portal, Some(dest), false, 1.0);
        let mut renderer = RecordingRenderer::default();

        capture.update_per_frame(
            &Pose::from_position(Vec3::new(0.0, 0.0, 5.0)),
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::new(0.0, 0.0, 200.0)),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(renderer.captures[0].1, 1024);

        capture.update_per_frame(
            &Pose::from_position(Vec3::new(0.0, 0.0, 5.0)),
            Mat4::IDENTITY,
            &registry,
            &FixedViewer(Vec3::new(0.0, 0.0, 2500.0)),
            &FixedViewport(None),
            &mut renderer,
        );
        assert_eq!(renderer.captures[1].1, 256);
    }
}
