use super::*;

#[test]
fn water_program_links_with_full_uniform_table() {
    let prog = ShaderProgram::from_sources(WATER_VERT, WATER_FRAG).unwrap();
    assert_eq!(prog.uniform_count(), 22);
    for name in ["u_base", "u_normal", "u_wake", "u_glowCenter", "u_glowStretchY"] {
        assert!(prog.uniform_location(name).is_some(), "{name}");
    }
    assert_eq!(prog.attribute_location("a_pos"), Some(0));
    assert_eq!(prog.attribute_location("a_uv"), Some(1));
}

#[test]
fn set_checks_uniform_type() {
    let mut prog = ShaderProgram::from_sources(WATER_VERT, WATER_FRAG).unwrap();
    let wake = prog.require_uniform("u_wake").unwrap();
    prog.set(wake, UniformValue::Float(0.4)).unwrap();
    assert_eq!(prog.value("u_wake"), Some(UniformValue::Float(0.4)));
    assert!(prog.set(wake, UniformValue::Vec2([0.0, 1.0])).is_err());

    let base = prog.require_uniform("u_base").unwrap();
    prog.set(base, UniformValue::Int(0)).unwrap();
    assert!(prog.require_uniform("u_missing").is_err());
}

#[test]
fn compile_rejects_broken_sources() {
    let cases = [
        (ShaderStage::Vertex, "void main() { gl_Position = vec4(0.0);"),
        (ShaderStage::Vertex, "void helper() { gl_Position = vec4(0.0); }"),
        (ShaderStage::Fragment, "void main() { }"),
        (ShaderStage::Fragment, "uniform mat9 u_x;\nvoid main() { gl_FragColor = vec4(1.0); }"),
        (ShaderStage::Fragment, "attribute vec2 a;\nvoid main() { gl_FragColor = vec4(1.0); }"),
        (
            ShaderStage::Fragment,
            "uniform float u;\nuniform float u;\nvoid main() { gl_FragColor = vec4(u); }",
        ),
    ];
    for (stage, src) in cases {
        let err = compile(stage, src).unwrap_err();
        assert!(matches!(err, PensieveError::Shader(_)), "{src}");
    }
}

#[test]
fn comments_are_ignored() {
    let src = "// uniform float u_gone;\n/* uniform vec2 u_block; */\nuniform float u_kept; // tail\nvoid main() { gl_FragColor = vec4(u_kept); }";
    let fs = compile(ShaderStage::Fragment, src).unwrap();
    assert_eq!(fs.uniforms(), &[("u_kept".to_owned(), GlslType::Float)]);
}

#[test]
fn link_rejects_unwritten_varying() {
    let vs = compile(
        ShaderStage::Vertex,
        "attribute vec2 a_pos;\nvoid main() { gl_Position = vec4(a_pos, 0.0, 1.0); }",
    )
    .unwrap();
    let fs = compile(
        ShaderStage::Fragment,
        "varying vec2 v_uv;\nvoid main() { gl_FragColor = vec4(v_uv, 0.0, 1.0); }",
    )
    .unwrap();
    assert!(matches!(
        ShaderProgram::link(&vs, &fs),
        Err(PensieveError::Shader(_))
    ));
}
