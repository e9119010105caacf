//! GLSL source splitting and uniform interface resolution
//!
//! Shader files hold every stage in one file, each introduced by a
//! `#type <stage>` line. Uniform declarations of the form
//! `uniform <type> <name>[N];` are resolved into [`UniformSlot`]s, expanding
//! arrays and light struct arrays (`N` may be a literal or a `#define`).

use std::collections::{BTreeSet, HashMap};

use super::UniformSlot;
use crate::render::{RenderError, RenderResult};

/// Pipeline stage a section of source belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Geometry shader
    Geometry,
    /// Fragment shader
    Fragment,
}

impl ShaderStage {
    fn from_directive(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "geometry" => Some(Self::Geometry),
            "fragment" | "pixel" => Some(Self::Fragment),
            _ => None,
        }
    }
}

/// Parsed shader: per-stage source plus the resolved uniform interface
#[derive(Debug, Clone)]
pub struct ShaderSource {
    name: String,
    stages: Vec<(ShaderStage, String)>,
    slots: BTreeSet<UniformSlot>,
    unresolved: Vec<String>,
}

impl ShaderSource {
    /// Split `source` into stages and resolve its uniform declarations
    ///
    /// Fails when the source has no vertex or no fragment stage, or when a
    /// `#type` directive names an unknown stage.
    pub fn parse(name: impl Into<String>, source: &str) -> RenderResult<Self> {
        let name = name.into();
        let stages = split_stages(&name, source)?;

        let stripped: String = stages
            .iter()
            .map(|(_, text)| strip_comments(text))
            .collect::<Vec<_>>()
            .join("\n");
        let defines = collect_defines(&stripped);
        let tokens = tokenize(&stripped);
        let structs = collect_structs(&tokens);

        let mut slots = BTreeSet::new();
        let mut unresolved = Vec::new();
        for decl in collect_uniforms(&tokens, &defines) {
            let resolved = resolve(&decl, &structs);
            if resolved.is_empty() {
                unresolved.push(decl.name.to_string());
            }
            slots.extend(resolved);
        }

        if !unresolved.is_empty() {
            log::debug!("Shader '{}': uniforms without a slot: {:?}", name, unresolved);
        }
        log::trace!("Shader '{}' resolved {} uniform slots", name, slots.len());

        Ok(Self { name, stages, slots, unresolved })
    }

    /// Shader name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source of one stage, if present
    pub fn stage(&self, stage: ShaderStage) -> Option<&str> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, text)| text.as_str())
    }

    /// Every stage present, in file order
    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        self.stages.iter().map(|(s, _)| *s)
    }

    /// Resolved uniform interface
    pub fn slots(&self) -> &BTreeSet<UniformSlot> {
        &self.slots
    }

    /// Whether the program declares a slot
    pub fn declares(&self, slot: UniformSlot) -> bool {
        self.slots.contains(&slot)
    }

    /// Declared uniforms the renderer has no slot for
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}

fn split_stages(name: &str, source: &str) -> RenderResult<Vec<(ShaderStage, String)>> {
    let mut stages: Vec<(ShaderStage, String)> = Vec::new();

    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#type") {
            let stage_name = rest.trim();
            let stage = ShaderStage::from_directive(stage_name).ok_or_else(|| {
                RenderError::ResourceCreationFailed(format!(
                    "shader '{name}': unknown stage '{stage_name}'"
                ))
            })?;
            stages.push((stage, String::new()));
            continue;
        }

        match stages.last_mut() {
            Some((_, text)) => {
                text.push_str(line);
                text.push('\n');
            }
            None if trimmed.is_empty() || trimmed.starts_with("//") => {}
            None => {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "shader '{name}': source before the first #type directive"
                )))
            }
        }
    }

    for required in [ShaderStage::Vertex, ShaderStage::Fragment] {
        if !stages.iter().any(|(s, _)| *s == required) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "shader '{name}': missing {required:?} stage"
            )));
        }
    }
    Ok(stages)
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some('/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                    out.push(' ');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

fn collect_defines(source: &str) -> HashMap<String, u32> {
    source
        .lines()
        .filter_map(|line| {
            let mut words = line.trim().split_whitespace();
            if words.next()? != "#define" {
                return None;
            }
            let name = words.next()?;
            let value = words.next()?.parse().ok()?;
            Some((name.to_string(), value))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Punct(char),
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for line in source.lines() {
        // Preprocessor lines were consumed by collect_defines
        if line.trim_start().starts_with('#') {
            continue;
        }

        let mut word_start: Option<usize> = None;
        for (i, c) in line.char_indices() {
            let is_word = c.is_alphanumeric() || c == '_' || c == '.';
            match (is_word, word_start) {
                (true, None) => word_start = Some(i),
                (true, Some(_)) => {}
                (false, start) => {
                    if let Some(start) = start {
                        tokens.push(Token::Word(&line[start..i]));
                        word_start = None;
                    }
                    if !c.is_whitespace() {
                        tokens.push(Token::Punct(c));
                    }
                }
            }
        }
        if let Some(start) = word_start {
            tokens.push(Token::Word(&line[start..]));
        }
    }
    tokens
}

/// `struct Name { type field; ... };` -> field names
fn collect_structs<'a>(tokens: &[Token<'a>]) -> HashMap<&'a str, Vec<&'a str>> {
    let mut structs = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        if let (Token::Word("struct"), Some(Token::Word(name)), Some(Token::Punct('{'))) =
            (tokens[i], tokens.get(i + 1).copied(), tokens.get(i + 2).copied())
        {
            let mut fields = Vec::new();
            let mut j = i + 3;
            let mut statement: Vec<&str> = Vec::new();
            while let Some(token) = tokens.get(j) {
                match token {
                    Token::Punct('}') => break,
                    Token::Punct(';') => {
                        // "type name" or "precision type name"
                        if let Some(field) = statement.last() {
                            fields.push(*field);
                        }
                        statement.clear();
                    }
                    Token::Word(w) => statement.push(w),
                    Token::Punct(_) => {}
                }
                j += 1;
            }
            structs.insert(name, fields);
            i = j;
        }
        i += 1;
    }
    structs
}

#[derive(Debug)]
struct UniformDecl<'a> {
    ty: &'a str,
    name: &'a str,
    array_len: Option<u32>,
}

fn collect_uniforms<'a>(tokens: &[Token<'a>], defines: &HashMap<String, u32>) -> Vec<UniformDecl<'a>> {
    let mut decls = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if *token != Token::Word("uniform") {
            continue;
        }

        let mut words = Vec::new();
        let mut array_len = None;
        let mut in_brackets = false;
        let mut j = i + 1;
        while let Some(token) = tokens.get(j) {
            match token {
                Token::Punct(';') => break,
                Token::Punct('[') => {
                    in_brackets = true;
                    if let Some(Token::Word(size)) = tokens.get(j + 1) {
                        array_len = size.parse().ok().or_else(|| defines.get(*size).copied());
                    }
                }
                Token::Punct(']') => in_brackets = false,
                Token::Word(w) if !in_brackets => words.push(*w),
                _ => {}
            }
            j += 1;
        }

        // Qualifiers such as highp precede the type
        if words.len() >= 2 {
            let name = words[words.len() - 1];
            let ty = words[words.len() - 2];
            decls.push(UniformDecl { ty, name, array_len });
        }
    }
    decls
}

fn resolve(decl: &UniformDecl<'_>, structs: &HashMap<&str, Vec<&str>>) -> Vec<UniformSlot> {
    let indices = |len: u32| (0..len.min(u32::from(u8::MAX))).filter_map(|i| u8::try_from(i).ok());

    match (structs.get(decl.ty), decl.array_len) {
        (Some(fields), Some(len)) if UniformSlot::is_light_array(decl.name) => indices(len)
            .flat_map(|i| {
                fields
                    .iter()
                    .filter_map(move |field| UniformSlot::from_glsl_field(decl.name, i, field))
            })
            .collect(),
        (Some(_), _) => Vec::new(),
        (None, Some(len)) => indices(len)
            .filter_map(|i| UniformSlot::from_glsl(decl.name, Some(i)))
            .collect(),
        (None, None) => UniformSlot::from_glsl(decl.name, None).into_iter().collect(),
    }
}
