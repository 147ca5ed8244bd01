use crate::effects::shader::{ShaderProgram, UniformLocation, UniformValue, WATER_FRAG, WATER_VERT};
use crate::effects::{Effect, EffectKey, Signal};
use crate::foundation::error::PensieveResult;
use crate::foundation::math::{clamp01, coerce_unit};
use crate::host::frame::FrameLoop;
use crate::host::stage::{ListenerId, Stage};
use crate::host::surface::Surface;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasinWaterOptions {
    pub canvas_id: String,
    pub base_url: String,
    pub normal_url: String,

    pub dark_water: [f64; 3],
    pub base_mix: f64,
    pub base_contrast: f64,
    pub base_brightness: f64,

    pub normal_scale: f64,
    pub normal_speed: f64,
    pub refract_strength: f64,

    pub second_layer_strength: f64,
    pub second_layer_scale_mul: f64,
    pub second_layer_speed_mul: f64,

    pub breath_speed: f64,
    pub breath_strength: f64,
    pub wake_boost: f64,

    pub glow_tint: [f64; 3],
    pub glow_intensity: f64,
    pub glow_center: [f64; 2],
    pub glow_stretch_y: f64,

    /// Use repeat wrapping for power-of-two textures.
    #[serde(rename = "preferRepeatIfPOT")]
    pub prefer_repeat_if_pot: bool,
    pub flip_y: bool,
}

impl Default for BasinWaterOptions {
    fn default() -> Self {
        Self {
            canvas_id: "basin-water".to_owned(),
            base_url: "assets/water-base.jpg".to_owned(),
            normal_url: "assets/water-normal.jpg".to_owned(),
            dark_water: [0.010, 0.014, 0.030],
            base_mix: 0.58,
            base_contrast: 1.06,
            base_brightness: 0.90,
            normal_scale: 1.55,
            normal_speed: 0.022,
            refract_strength: 0.010,
            second_layer_strength: 0.35,
            second_layer_scale_mul: 1.35,
            second_layer_speed_mul: 0.65,
            breath_speed: 0.8,
            breath_strength: 0.06,
            wake_boost: 0.18,
            glow_tint: [0.16, 0.24, 0.44],
            glow_intensity: 0.16,
            glow_center: [0.5, 0.72],
            glow_stretch_y: 1.25,
            prefer_repeat_if_pot: true,
            flip_y: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureUnit {
    Base,
    Normal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TextureState {
    /// The 1x1 placeholder colour is bound.
    Fallback,
    Loaded { width: u32, height: u32 },
    Failed,
}

#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterTexture {
    pub url: String,
    pub fallback: [u8; 4],
    pub wrap: TextureWrap,
    pub state: TextureState,
}

impl WaterTexture {
    fn new(url: &str, fallback: [u8; 4]) -> Self {
        Self {
            url: url.to_owned(),
            fallback,
            wrap: TextureWrap::ClampToEdge,
            state: TextureState::Fallback,
        }
    }

    /// Normalized placeholder colour.
    pub fn fallback_rgb(&self) -> [f64; 3] {
        let [r, g, b, _] = self.fallback;
        [
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        ]
    }
}

pub const BASE_FALLBACK: [u8; 4] = [18, 22, 34, 255];
pub const NORMAL_FALLBACK: [u8; 4] = [128, 128, 255, 255];

/// All values the water shader reads in one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterUniforms {
    pub res: [f64; 2],
    pub time: f64,
    pub wake: f64,
    pub dark: [f64; 3],
    pub base_mix: f64,
    pub base_contrast: f64,
    pub base_brightness: f64,
    pub normal_scale: f64,
    pub normal_speed: f64,
    pub refract: f64,
    pub second_strength: f64,
    pub second_scale_mul: f64,
    pub second_speed_mul: f64,
    pub breath_speed: f64,
    pub breath_strength: f64,
    pub wake_boost: f64,
    pub glow_tint: [f64; 3],
    pub glow_intensity: f64,
    pub glow_center: [f64; 2],
    pub glow_stretch_y: f64,
}

impl WaterUniforms {
    /// Evaluate the fragment shader at `uv` with constant base/normal samples (the 1x1
    /// placeholders, or any flat colour).
    pub fn shade(&self, uv: [f64; 2], base_rgb: [f64; 3], normal_rgb: [f64; 3]) -> [f64; 3] {
        let n1 = [normal_rgb[0] * 2.0 - 1.0, normal_rgb[1] * 2.0 - 1.0];
        let nx = n1[0] + n1[0] * self.second_strength;
        let ny = n1[1] + n1[1] * self.second_strength;
        let len = nx.hypot(ny);
        let n = if len > 0.0 { [nx / len, ny / len] } else { [0.0, 0.0] };

        let duv = [uv[0] + n[0] * self.refract, uv[1] + n[1] * self.refract];

        let mut col = [0.0; 3];
        for i in 0..3 {
            let base = ((base_rgb[i] - 0.5) * self.base_contrast + 0.5) * self.base_brightness;
            col[i] = mix(self.dark[i], base, self.base_mix);
        }

        let depth = smoothstep(0.08, 0.95, duv[1]);
        let depth_gain = mix(0.92, 1.02, depth);

        let dx = duv[0] - self.glow_center[0];
        let dy = (duv[1] - self.glow_center[1]) * self.glow_stretch_y;
        let d2 = dx * dx + dy * dy;
        let halo = (-d2 * 6.5).exp();

        let breath = 0.5 + 0.5 * (self.time * self.breath_speed).sin();
        let breath_gain = 1.0 + (breath - 0.5) * self.breath_strength;
        let wake_gain = 1.0 + self.wake * self.wake_boost;

        let vx = uv[0] - 0.5;
        let vy = uv[1] - 0.56;
        let v = smoothstep(0.95, 0.34, vx.hypot(vy));
        let vignette = mix(0.90, 1.0, v);

        for i in 0..3 {
            col[i] *= depth_gain;
            col[i] += self.glow_tint[i] * halo * self.glow_intensity * breath_gain * wake_gain;
            col[i] *= vignette;
        }
        col
    }
}

fn mix(a: f64, b: f64, k: f64) -> f64 {
    a + (b - a) * k
}

fn smoothstep(e0: f64, e1: f64, x: f64) -> f64 {
    let t = clamp01((x - e0) / (e1 - e0));
    t * t * (3.0 - 2.0 * t)
}

#[derive(Clone, Copy, Debug)]
struct WaterLocations {
    base: UniformLocation,
    normal: UniformLocation,
    res: UniformLocation,
    time: UniformLocation,
    wake: UniformLocation,
    dark: UniformLocation,
    base_mix: UniformLocation,
    base_contrast: UniformLocation,
    base_brightness: UniformLocation,
    normal_scale: UniformLocation,
    normal_speed: UniformLocation,
    refract: UniformLocation,
    second_strength: UniformLocation,
    second_scale_mul: UniformLocation,
    second_speed_mul: UniformLocation,
    breath_speed: UniformLocation,
    breath_strength: UniformLocation,
    wake_boost: UniformLocation,
    glow_tint: UniformLocation,
    glow_intensity: UniformLocation,
    glow_center: UniformLocation,
    glow_stretch_y: UniformLocation,
}

impl WaterLocations {
    fn resolve(p: &ShaderProgram) -> PensieveResult<Self> {
        Ok(Self {
            base: p.require_uniform("u_base")?,
            normal: p.require_uniform("u_normal")?,
            res: p.require_uniform("u_res")?,
            time: p.require_uniform("u_time")?,
            wake: p.require_uniform("u_wake")?,
            dark: p.require_uniform("u_dark")?,
            base_mix: p.require_uniform("u_baseMix")?,
            base_contrast: p.require_uniform("u_baseContrast")?,
            base_brightness: p.require_uniform("u_baseBrightness")?,
            normal_scale: p.require_uniform("u_normalScale")?,
            normal_speed: p.require_uniform("u_normalSpeed")?,
            refract: p.require_uniform("u_refract")?,
            second_strength: p.require_uniform("u_secondStrength")?,
            second_scale_mul: p.require_uniform("u_secondScaleMul")?,
            second_speed_mul: p.require_uniform("u_secondSpeedMul")?,
            breath_speed: p.require_uniform("u_breathSpeed")?,
            breath_strength: p.require_uniform("u_breathStrength")?,
            wake_boost: p.require_uniform("u_wakeBoost")?,
            glow_tint: p.require_uniform("u_glowTint")?,
            glow_intensity: p.require_uniform("u_glowIntensity")?,
            glow_center: p.require_uniform("u_glowCenter")?,
            glow_stretch_y: p.require_uniform("u_glowStretchY")?,
        })
    }
}

/// The WebGL water surface under the basin.
///
/// Consumes the wake level from [`crate::effects::basin_wake::BasinWake`] and starts its
/// own frame loop once the basin becomes visible.
#[derive(Clone, Debug)]
pub struct BasinWater {
    opts: BasinWaterOptions,
    surface: Surface,
    listener: ListenerId,
    program: ShaderProgram,
    loc: WaterLocations,
    base: WaterTexture,
    normal: WaterTexture,
    frames: FrameLoop,
    t0_ms: Option<f64>,
    time: f64,
    wake: f64,
    draws: u64,
}

impl BasinWater {
    /// `Ok(None)` when the canvas is missing or has no WebGL; `Err` when the shader
    /// program fails to compile or link.
    pub fn create(opts: BasinWaterOptions, stage: &mut Stage) -> PensieveResult<Option<Self>> {
        Self::create_with_shaders(opts, stage, WATER_VERT, WATER_FRAG)
    }

    pub fn create_with_shaders(
        opts: BasinWaterOptions,
        stage: &mut Stage,
        vertex: &str,
        fragment: &str,
    ) -> PensieveResult<Option<Self>> {
        if !stage.has_canvas(&opts.canvas_id) {
            return Ok(None);
        }
        let Some(surface) = stage.claim_webgl_canvas(&opts.canvas_id) else {
            return Ok(None);
        };

        let linked = ShaderProgram::from_sources(vertex, fragment)
            .and_then(|p| WaterLocations::resolve(&p).map(|loc| (p, loc)));
        let (mut program, loc) = match linked {
            Ok(v) => v,
            Err(err) => {
                stage.release_canvas(&opts.canvas_id);
                return Err(err);
            }
        };
        program.set(loc.base, UniformValue::Int(0))?;
        program.set(loc.normal, UniformValue::Int(1))?;

        let base = WaterTexture::new(&opts.base_url, BASE_FALLBACK);
        let normal = WaterTexture::new(&opts.normal_url, NORMAL_FALLBACK);
        let listener = stage.listen_resize(EffectKey::BasinWater.as_str());

        let mut water = Self {
            opts,
            surface,
            listener,
            program,
            loc,
            base,
            normal,
            frames: FrameLoop::default(),
            t0_ms: None,
            time: 0.0,
            wake: 0.0,
            draws: 0,
        };
        water.resize_to(stage);
        Ok(Some(water))
    }

    fn resize_to(&mut self, stage: &Stage) {
        let Some(rect) = stage.canvas_rect(&self.opts.canvas_id) else {
            return;
        };
        self.surface
            .resize(rect.width(), rect.height(), stage.viewport().dpr());
    }

    /// Soft setter: non-finite values become 0, the rest clamp to `[0, 1]`.
    pub fn set_wake(&mut self, p: f64) {
        self.wake = coerce_unit(p);
    }

    pub fn wake(&self) -> f64 {
        self.wake
    }

    pub fn start(&mut self) {
        if self.frames.request() {
            tracing::debug!("basin water loop started");
        }
    }

    pub fn texture(&self, unit: TextureUnit) -> &WaterTexture {
        match unit {
            TextureUnit::Base => &self.base,
            TextureUnit::Normal => &self.normal,
        }
    }

    /// Image decode finished for `unit`.
    pub fn texture_loaded(&mut self, unit: TextureUnit, width: u32, height: u32) {
        let prefer_repeat = self.opts.prefer_repeat_if_pot;
        let tex = self.texture_mut(unit);
        let pot = width.is_power_of_two() && height.is_power_of_two();
        tex.wrap = if pot && prefer_repeat {
            TextureWrap::Repeat
        } else {
            TextureWrap::ClampToEdge
        };
        tex.state = TextureState::Loaded { width, height };
    }

    /// Image failed to load for `unit`. The placeholder stays bound.
    pub fn texture_failed(&mut self, unit: TextureUnit) {
        let tex = self.texture_mut(unit);
        tracing::warn!(url = %tex.url, "failed to load water texture");
        tex.state = TextureState::Failed;
    }

    fn texture_mut(&mut self, unit: TextureUnit) -> &mut WaterTexture {
        match unit {
            TextureUnit::Base => &mut self.base,
            TextureUnit::Normal => &mut self.normal,
        }
    }

    pub fn uniforms(&self) -> WaterUniforms {
        let (w, h) = self.surface.backing_size();
        let o = &self.opts;
        WaterUniforms {
            res: [f64::from(w), f64::from(h)],
            time: self.time,
            wake: self.wake,
            dark: o.dark_water,
            base_mix: o.base_mix,
            base_contrast: o.base_contrast,
            base_brightness: o.base_brightness,
            normal_scale: o.normal_scale,
            normal_speed: o.normal_speed,
            refract: o.refract_strength,
            second_strength: o.second_layer_strength,
            second_scale_mul: o.second_layer_scale_mul,
            second_speed_mul: o.second_layer_speed_mul,
            breath_speed: o.breath_speed,
            breath_strength: o.breath_strength,
            wake_boost: o.wake_boost,
            glow_tint: o.glow_tint,
            glow_intensity: o.glow_intensity,
            glow_center: o.glow_center,
            glow_stretch_y: o.glow_stretch_y,
        }
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Frames drawn since creation.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    fn upload(&mut self) -> PensieveResult<()> {
        let u = self.uniforms();
        let l = self.loc;
        let p = &mut self.program;
        p.set(l.res, UniformValue::Vec2(u.res))?;
        p.set(l.time, UniformValue::Float(u.time))?;
        p.set(l.wake, UniformValue::Float(u.wake))?;
        p.set(l.dark, UniformValue::Vec3(u.dark))?;
        p.set(l.base_mix, UniformValue::Float(u.base_mix))?;
        p.set(l.base_contrast, UniformValue::Float(u.base_contrast))?;
        p.set(l.base_brightness, UniformValue::Float(u.base_brightness))?;
        p.set(l.normal_scale, UniformValue::Float(u.normal_scale))?;
        p.set(l.normal_speed, UniformValue::Float(u.normal_speed))?;
        p.set(l.refract, UniformValue::Float(u.refract))?;
        p.set(l.second_strength, UniformValue::Float(u.second_strength))?;
        p.set(l.second_scale_mul, UniformValue::Float(u.second_scale_mul))?;
        p.set(l.second_speed_mul, UniformValue::Float(u.second_speed_mul))?;
        p.set(l.breath_speed, UniformValue::Float(u.breath_speed))?;
        p.set(l.breath_strength, UniformValue::Float(u.breath_strength))?;
        p.set(l.wake_boost, UniformValue::Float(u.wake_boost))?;
        p.set(l.glow_tint, UniformValue::Vec3(u.glow_tint))?;
        p.set(l.glow_intensity, UniformValue::Float(u.glow_intensity))?;
        p.set(l.glow_center, UniformValue::Vec2(u.glow_center))?;
        p.set(l.glow_stretch_y, UniformValue::Float(u.glow_stretch_y))?;
        Ok(())
    }
}

impl Effect for BasinWater {
    fn key(&self) -> EffectKey {
        EffectKey::BasinWater
    }

    /// Driven by signals and its own loop.
    fn apply(&mut self, _t: f64) {}

    fn reset(&mut self) {
        self.stop();
        self.wake = 0.0;
    }

    fn stop(&mut self) {
        if self.frames.is_active() {
            tracing::debug!("basin water loop stopped");
        }
        self.frames.cancel();
    }

    fn resize(&mut self, stage: &Stage) {
        self.resize_to(stage);
    }

    fn frame(&mut self, now_ms: f64) {
        if !self.frames.is_active() {
            return;
        }
        self.frames.advance(now_ms);
        let t0 = *self.t0_ms.get_or_insert(now_ms);
        self.time = (now_ms - t0) / 1000.0;
        if let Err(err) = self.upload() {
            tracing::warn!(%err, "basin water uniform upload failed");
            return;
        }
        self.draws += 1;
    }

    fn is_looping(&self) -> bool {
        self.frames.is_active()
    }

    fn accept(&mut self, signal: &Signal) {
        match signal {
            Signal::Wake { level } => self.set_wake(*level),
            Signal::Visibility { shown: true, .. } => self.start(),
            Signal::Visibility { shown: false, .. } => self.stop(),
            _ => {}
        }
    }

    fn surface(&self) -> Option<&Surface> {
        Some(&self.surface)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "running": self.frames.is_active(),
            "wake": self.wake,
            "time": self.time,
            "textures": { "base": self.base, "normal": self.normal },
            "uniforms": self.program.snapshot(),
        })
    }

    fn listener(&self) -> Option<ListenerId> {
        Some(self.listener)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/basin_water.rs"]
mod tests;
