// kettle-core/src/recipe/dsl.rs
//! Parser for the formula DSL: one statement per line, a single
//! `class X < Formula` block holding metadata and a `def install` block.

use kettle_common::dependency::{Dependency, DependencyTag};
use kettle_common::error::{KettleError, Result};
use kettle_common::model::recipe::{class_to_token, looks_like_git};
use kettle_common::model::{FetchStrategy, InstallStep, Recipe, SourceLocation, SourceSpec};
use regex::Regex;
use tracing::trace;

use super::lexer::{tokenize, Token};
use crate::build::env::{check_interpolation, interpolations};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    TopLevel,
    Class,
    Install,
    Done,
}

#[derive(Default)]
struct Draft {
    class_name: Option<String>,
    source: Option<SourceLocation>,
    homepage: Option<String>,
    desc: Option<String>,
    version: Option<String>,
    dependencies: Vec<Dependency>,
    install_steps: Vec<InstallStep>,
    saw_install: bool,
}

fn err(line: usize, msg: impl Into<String>) -> KettleError {
    KettleError::ParseError(line, msg.into())
}

pub(crate) fn parse(text: &str) -> Result<Recipe> {
    let class_header = Regex::new(r"^\s*class\s+([A-Z][A-Za-z0-9_]*)\s*<\s*(\S+)\s*$")
        .map_err(|e| err(0, format!("internal regex error: {e}")))?;

    let mut section = Section::TopLevel;
    let mut draft = Draft::default();
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;

        if section == Section::TopLevel {
            if let Some(caps) = class_header.captures(raw) {
                if &caps[2] != "Formula" {
                    return Err(err(
                        line_no,
                        format!("class {} must inherit from Formula, not {}", &caps[1], &caps[2]),
                    ));
                }
                draft.class_name = Some(caps[1].to_string());
                section = Section::Class;
                continue;
            }
        }

        let tokens = tokenize(raw, line_no)?;
        if tokens.is_empty() {
            continue;
        }
        trace!("line {}: {:?}", line_no, tokens);

        section = match section {
            Section::TopLevel => top_level(&tokens, line_no)?,
            Section::Class => class_body(&tokens, line_no, &mut draft)?,
            Section::Install => install_body(&tokens, line_no, &mut draft)?,
            Section::Done => {
                return Err(err(line_no, "unexpected content after the formula class"));
            }
        };
    }

    match section {
        Section::Done => {}
        Section::TopLevel => return Err(err(last_line, "no `class <Name> < Formula` found")),
        Section::Class => return Err(err(last_line, "formula class is missing its `end`")),
        Section::Install => return Err(err(last_line, "install block is missing its `end`")),
    }

    let class_name = draft
        .class_name
        .ok_or_else(|| err(0, "no formula class"))?;
    let source = draft.source.ok_or_else(|| {
        err(
            0,
            format!("formula {class_name} declares no source (`head` or `url`)"),
        )
    })?;
    if !draft.saw_install {
        return Err(err(0, format!("formula {class_name} has no `def install` block")));
    }

    let recipe = Recipe {
        name: class_to_token(&class_name),
        class_name,
        source,
        homepage: draft.homepage,
        desc: draft.desc,
        version: draft.version,
        dependencies: draft.dependencies,
        install_steps: draft.install_steps,
    };
    recipe.validate()?;
    Ok(recipe)
}

fn top_level(tokens: &[Token], line_no: usize) -> Result<Section> {
    match tokens {
        [Token::Word(w), Token::Str(_)] if w == "require" => Ok(Section::TopLevel),
        [Token::Word(w), ..] if w == "class" => Err(err(
            line_no,
            "malformed class header, expected `class <Name> < Formula`",
        )),
        _ => Err(err(line_no, "unexpected statement outside the formula class")),
    }
}

fn class_body(tokens: &[Token], line_no: usize, draft: &mut Draft) -> Result<Section> {
    let tokens = strip_call_parens(tokens);
    let Some(Token::Word(keyword)) = tokens.first() else {
        return Err(err(line_no, "expected a formula statement"));
    };
    let args = &tokens[1..];

    match keyword.as_str() {
        "end" if args.is_empty() => return Ok(Section::Done),
        "def" => {
            return match args {
                [Token::Word(method)] if method == "install" => {
                    if draft.saw_install {
                        return Err(err(line_no, "`def install` declared twice"));
                    }
                    draft.saw_install = true;
                    Ok(Section::Install)
                }
                _ => Err(err(line_no, "only `def install` is supported")),
            };
        }
        "homepage" => set_once(&mut draft.homepage, args, line_no, "homepage")?,
        "desc" => set_once(&mut draft.desc, args, line_no, "desc")?,
        "version" => set_once(&mut draft.version, args, line_no, "version")?,
        "head" | "url" => {
            if draft.source.is_some() {
                return Err(err(line_no, "source declared more than once"));
            }
            let spec = if keyword == "head" {
                SourceSpec::Head
            } else {
                SourceSpec::Stable
            };
            draft.source = Some(source_location(args, spec, line_no)?);
        }
        "depends_on" => {
            let dep = dependency(args, line_no)?;
            if draft.dependencies.iter().any(|d| d.name == dep.name) {
                return Err(err(
                    line_no,
                    format!("dependency '{}' declared more than once", dep.name),
                ));
            }
            draft.dependencies.push(dep);
        }
        other => return Err(err(line_no, format!("unsupported formula statement `{other}`"))),
    }
    Ok(Section::Class)
}

fn install_body(tokens: &[Token], line_no: usize, draft: &mut Draft) -> Result<Section> {
    let tokens = strip_call_parens(tokens);
    match tokens.first() {
        Some(Token::Word(w)) if w == "end" && tokens.len() == 1 => {
            if draft.install_steps.is_empty() {
                return Err(err(line_no, "install block declares no steps"));
            }
            Ok(Section::Class)
        }
        Some(Token::Word(w)) if w == "system" => {
            let parts = string_list(&tokens[1..], line_no)?;
            for part in &parts {
                for name in interpolations(part) {
                    check_interpolation(name)
                        .map_err(|msg| err(line_no, msg))?;
                }
            }
            let mut parts = parts.into_iter();
            let program = parts
                .next()
                .ok_or_else(|| err(line_no, "`system` needs a command"))?;
            let args: Vec<String> = parts.collect();
            let step = if args.is_empty() {
                InstallStep::Shell(program)
            } else {
                InstallStep::Exec { program, args }
            };
            draft.install_steps.push(step);
            Ok(Section::Install)
        }
        _ => Err(err(line_no, "only `system` calls are supported inside `def install`")),
    }
}

/// Drops `(` after the keyword and the matching trailing `)`.
fn strip_call_parens(tokens: &[Token]) -> Vec<Token> {
    match tokens {
        [first, Token::LParen, rest @ .., Token::RParen] => {
            let mut out = vec![first.clone()];
            out.extend_from_slice(rest);
            out
        }
        _ => tokens.to_vec(),
    }
}

fn set_once(slot: &mut Option<String>, args: &[Token], line_no: usize, what: &str) -> Result<()> {
    if slot.is_some() {
        return Err(err(line_no, format!("`{what}` declared more than once")));
    }
    match args {
        [Token::Str(s)] => {
            *slot = Some(s.clone());
            Ok(())
        }
        _ => Err(err(line_no, format!("`{what}` expects a single string"))),
    }
}

fn string_list(args: &[Token], line_no: usize) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut expect_value = true;
    for token in args {
        match (expect_value, token) {
            (true, Token::Str(s)) => out.push(s.clone()),
            (false, Token::Comma) => {}
            _ => return Err(err(line_no, "expected a comma-separated list of strings")),
        }
        expect_value = !expect_value;
    }
    if expect_value {
        // empty list or trailing comma
        return Err(err(line_no, "expected a string"));
    }
    Ok(out)
}

fn source_location(args: &[Token], spec: SourceSpec, line_no: usize) -> Result<SourceLocation> {
    let (url, options) = match args {
        [Token::Str(url), rest @ ..] => (url.clone(), rest),
        _ => return Err(err(line_no, "source expects a url string")),
    };

    let mut strategy = None;
    match options {
        [] => {}
        [Token::Comma, Token::Symbol(key), Token::Arrow, Token::Symbol(value)]
        | [Token::Comma, Token::Key(key), Token::Symbol(value)]
            if key == "using" =>
        {
            strategy = Some(match value.as_str() {
                "git" => FetchStrategy::Git,
                "curl" => FetchStrategy::Url,
                other => {
                    return Err(err(line_no, format!("unsupported download strategy :{other}")))
                }
            });
        }
        _ => return Err(err(line_no, "only the `:using` option is supported on sources")),
    }

    let strategy = strategy.unwrap_or(if looks_like_git(&url) {
        FetchStrategy::Git
    } else {
        FetchStrategy::Url
    });
    Ok(SourceLocation { url, strategy, spec })
}

fn dependency(args: &[Token], line_no: usize) -> Result<Dependency> {
    let (name, tags) = match args {
        [Token::Str(name)] => return Ok(Dependency::new_runtime(name.clone())),
        [Token::Str(name), Token::Arrow, Token::Symbol(tag)] => {
            (name, dependency_tag(tag, line_no)?)
        }
        [Token::Str(name), Token::Arrow, Token::LBracket, list @ .., Token::RBracket] => {
            (name, dependency_tag_list(list, line_no)?)
        }
        _ => {
            return Err(err(
                line_no,
                "`depends_on` expects a name, optionally followed by `=> :tag` or `=> [:tag, ...]`",
            ))
        }
    };
    Ok(Dependency::new_with_tags(name.clone(), tags))
}

fn dependency_tag(symbol: &str, line_no: usize) -> Result<DependencyTag> {
    DependencyTag::from_symbol(symbol)
        .ok_or_else(|| err(line_no, format!("unknown dependency tag :{symbol}")))
}

fn dependency_tag_list(list: &[Token], line_no: usize) -> Result<DependencyTag> {
    let mut tags = DependencyTag::empty();
    let mut expect_symbol = true;
    for token in list {
        match (expect_symbol, token) {
            (true, Token::Symbol(symbol)) => tags |= dependency_tag(symbol, line_no)?,
            (false, Token::Comma) => {}
            _ => return Err(err(line_no, "expected a comma-separated list of tag symbols")),
        }
        expect_symbol = !expect_symbol;
    }
    if expect_symbol {
        return Err(err(line_no, "dependency tag list is empty or ends with a comma"));
    }
    Ok(tags)
}
