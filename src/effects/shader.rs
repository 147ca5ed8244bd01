use crate::foundation::error::{PensieveError, PensieveResult};

/// Vertex shader of the basin water quad.
pub const WATER_VERT: &str = include_str!("shaders/water.vert");
/// Fragment shader of the basin water.
pub const WATER_FRAG: &str = include_str!("shaders/water.frag");

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GlslType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Sampler2D,
}

impl GlslType {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "int" => Self::Int,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "sampler2D" => Self::Sampler2D,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum UniformValue {
    Int(i32),
    Float(f64),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
}

impl UniformValue {
    /// Whether this value may be uploaded to a uniform of type `ty`. Samplers take a
    /// texture unit index.
    pub fn fits(&self, ty: GlslType) -> bool {
        matches!(
            (self, ty),
            (Self::Int(_), GlslType::Int | GlslType::Sampler2D)
                | (Self::Float(_), GlslType::Float)
                | (Self::Vec2(_), GlslType::Vec2)
                | (Self::Vec3(_), GlslType::Vec3)
                | (Self::Vec4(_), GlslType::Vec4)
        )
    }
}

/// Interface of one compiled stage: its global `uniform`, `attribute` and `varying`
/// declarations.
#[derive(Clone, Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    uniforms: Vec<(String, GlslType)>,
    attributes: Vec<(String, GlslType)>,
    varyings: Vec<(String, GlslType)>,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn uniforms(&self) -> &[(String, GlslType)] {
        &self.uniforms
    }
}

/// Compile a GLSL ES 1.0 stage far enough to know its interface.
///
/// Rejects unbalanced sources, a missing `main`, a stage that never writes its output,
/// unknown interface types and duplicate declarations.
pub fn compile(stage: ShaderStage, source: &str) -> PensieveResult<CompiledShader> {
    let src = strip_comments(source);
    check_balanced(&src, stage)?;

    if !has_main(&src) {
        return Err(PensieveError::shader(format!(
            "{stage:?} shader: missing void main()"
        )));
    }
    let output = match stage {
        ShaderStage::Vertex => "gl_Position",
        ShaderStage::Fragment => "gl_FragColor",
    };
    if !src.contains(output) {
        return Err(PensieveError::shader(format!(
            "{stage:?} shader never writes {output}"
        )));
    }

    let mut out = CompiledShader {
        stage,
        uniforms: Vec::new(),
        attributes: Vec::new(),
        varyings: Vec::new(),
    };

    for stmt in src.split(';') {
        // Only the tail after the last block boundary can be a global declaration.
        let stmt = stmt.rsplit(['{', '}']).next().unwrap_or(stmt);
        let mut tokens = stmt.split_whitespace();
        let Some(qualifier) = tokens.next() else {
            continue;
        };
        if !matches!(qualifier, "uniform" | "attribute" | "varying") {
            continue;
        }
        let mut ty_tok = tokens.next().unwrap_or_default();
        if matches!(ty_tok, "lowp" | "mediump" | "highp") {
            ty_tok = tokens.next().unwrap_or_default();
        }
        let ty = GlslType::parse(ty_tok).ok_or_else(|| {
            PensieveError::shader(format!(
                "{stage:?} shader: unsupported {qualifier} type '{ty_tok}'"
            ))
        })?;
        let rest = tokens.collect::<Vec<_>>().join(" ");
        for name in rest.split(',').map(str::trim) {
            if !is_identifier(name) {
                return Err(PensieveError::shader(format!(
                    "{stage:?} shader: bad {qualifier} name '{name}'"
                )));
            }
            if out.declares(name) {
                return Err(PensieveError::shader(format!(
                    "{stage:?} shader: '{name}' declared twice"
                )));
            }
            let decl = (name.to_owned(), ty);
            match qualifier {
                "uniform" => out.uniforms.push(decl),
                "attribute" => {
                    if stage != ShaderStage::Vertex {
                        return Err(PensieveError::shader(format!(
                            "attribute '{name}' outside the vertex shader"
                        )));
                    }
                    out.attributes.push(decl);
                }
                _ => out.varyings.push(decl),
            }
        }
    }

    Ok(out)
}

impl CompiledShader {
    fn declares(&self, name: &str) -> bool {
        self.uniforms
            .iter()
            .chain(&self.attributes)
            .chain(&self.varyings)
            .any(|(n, _)| n == name)
    }
}

fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while !rest.is_empty() {
        let line = rest.find("//");
        let block = rest.find("/*");
        match (line, block) {
            (Some(l), b) if b.is_none_or(|b| l < b) => {
                out.push_str(&rest[..l]);
                rest = match rest[l..].find('\n') {
                    Some(nl) => &rest[l + nl..],
                    None => "",
                };
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                out.push(' ');
                rest = match rest[b + 2..].find("*/") {
                    Some(end) => &rest[b + 2 + end + 2..],
                    None => "",
                };
            }
            _ => {
                out.push_str(rest);
                rest = "";
            }
        }
    }
    out
}

fn check_balanced(src: &str, stage: ShaderStage) -> PensieveResult<()> {
    let mut braces = 0i64;
    let mut parens = 0i64;
    for c in src.chars() {
        match c {
            '{' => braces += 1,
            '}' => braces -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            _ => {}
        }
        if braces < 0 || parens < 0 {
            break;
        }
    }
    if braces != 0 || parens != 0 {
        return Err(PensieveError::shader(format!(
            "{stage:?} shader: unbalanced braces or parentheses"
        )));
    }
    Ok(())
}

fn has_main(src: &str) -> bool {
    src.match_indices("void").any(|(i, _)| {
        let after = src[i + 4..].trim_start();
        after
            .strip_prefix("main")
            .is_some_and(|rest| rest.trim_start().starts_with('('))
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Handle to a uniform of a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLocation(usize);

#[derive(Clone, Debug, serde::Serialize)]
struct UniformSlot {
    name: String,
    ty: GlslType,
    value: Option<UniformValue>,
}

/// A linked vertex + fragment pair and its current uniform values.
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    uniforms: Vec<UniformSlot>,
    attributes: Vec<(String, GlslType)>,
}

impl ShaderProgram {
    pub fn from_sources(vertex: &str, fragment: &str) -> PensieveResult<Self> {
        let vs = compile(ShaderStage::Vertex, vertex)?;
        let fs = compile(ShaderStage::Fragment, fragment)?;
        Self::link(&vs, &fs)
    }

    pub fn link(vertex: &CompiledShader, fragment: &CompiledShader) -> PensieveResult<Self> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return Err(PensieveError::shader("link needs one vertex and one fragment stage"));
        }

        for (name, ty) in &fragment.varyings {
            match vertex.varyings.iter().find(|(n, _)| n == name) {
                Some((_, vty)) if vty == ty => {}
                Some((_, vty)) => {
                    return Err(PensieveError::shader(format!(
                        "varying '{name}' is {vty:?} in the vertex shader but {ty:?} in the fragment shader"
                    )));
                }
                None => {
                    return Err(PensieveError::shader(format!(
                        "varying '{name}' is not written by the vertex shader"
                    )));
                }
            }
        }

        let mut uniforms: Vec<UniformSlot> = Vec::new();
        for (name, ty) in vertex.uniforms.iter().chain(&fragment.uniforms) {
            match uniforms.iter().find(|u| &u.name == name) {
                Some(u) if u.ty != *ty => {
                    return Err(PensieveError::shader(format!(
                        "uniform '{name}' declared as both {:?} and {ty:?}",
                        u.ty
                    )));
                }
                Some(_) => {}
                None => uniforms.push(UniformSlot {
                    name: name.clone(),
                    ty: *ty,
                    value: None,
                }),
            }
        }

        tracing::debug!(
            uniforms = uniforms.len(),
            attributes = vertex.attributes.len(),
            "shader program linked"
        );
        Ok(Self {
            uniforms,
            attributes: vertex.attributes.clone(),
        })
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(UniformLocation)
    }

    /// Like [`ShaderProgram::uniform_location`], but a missing uniform is a link error.
    pub fn require_uniform(&self, name: &str) -> PensieveResult<UniformLocation> {
        self.uniform_location(name)
            .ok_or_else(|| PensieveError::shader(format!("uniform '{name}' not found in program")))
    }

    pub fn attribute_location(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|(n, _)| n == name)
    }

    pub fn set(&mut self, loc: UniformLocation, value: UniformValue) -> PensieveResult<()> {
        let slot = self
            .uniforms
            .get_mut(loc.0)
            .ok_or_else(|| PensieveError::shader("stale uniform location"))?;
        if !value.fits(slot.ty) {
            return Err(PensieveError::shader(format!(
                "uniform '{}' is {:?}, got {value:?}",
                slot.name, slot.ty
            )));
        }
        slot.value = Some(value);
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .and_then(|u| u.value)
    }

    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Current uniform values by name, for inspection.
    pub fn snapshot(&self) -> serde_json::Value {
        let map = self
            .uniforms
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    serde_json::to_value(u.value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shader.rs"]
mod tests;
