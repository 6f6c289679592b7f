// SPDX-License-Identifier: MIT

//! Built-in graph factories
//!
//! Registered under the `demos` module so a pipelines document can reference
//! them without any user code:
//! - `demos.arithmetic` - sum, count and mean of a list of numbers
//! - `demos.text` - word statistics for a piece of text

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use super::registry::{GraphRegistry, Produced};
use crate::engine::{
    ArgType, ArgumentDef, ArgumentSchema, ExecutionContext, Graph, GraphError, InputBinding,
    Inputs, Node, OutputDef, SourceError, TransformError,
};

static TEXT_SCHEMA: Lazy<ArgumentSchema> = Lazy::new(|| {
    ArgumentSchema::new()
        .with_arg("text", ArgumentDef::required(ArgType::String))
        .with_arg(
            "lowercase",
            ArgumentDef::optional(ArgType::Boolean, Some(json!(false))),
        )
});

/// Register every demo factory
pub fn register_demos(registry: &mut GraphRegistry) {
    registry.register("demos", "arithmetic", arithmetic);
    registry.register("demos", "text", text);
}

fn numbers_of(inputs: &Inputs, name: &str) -> Result<Vec<f64>, TransformError> {
    inputs
        .require(name)?
        .as_array()
        .ok_or_else(|| TransformError::new(format!("'{}' is not a list", name)))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| TransformError::new(format!("'{}' is not a number", v)))
        })
        .collect()
}

fn number_of(inputs: &Inputs, name: &str) -> Result<f64, TransformError> {
    inputs
        .require(name)?
        .as_f64()
        .ok_or_else(|| TransformError::new(format!("'{}' is not a number", name)))
}

/// numbers -> (sum, count) -> mean
pub fn arithmetic() -> Result<Produced, GraphError> {
    let numbers = Node::new(
        "numbers",
        vec![InputBinding::from_argument("values", "values", ArgType::Array)],
        OutputDef::NoMaterialization,
        |inputs: &Inputs, _: &ExecutionContext| Ok(json!(numbers_of(inputs, "values")?)),
    )?
    .with_description("Reads the list of numbers from the environment");

    let sum = Node::new(
        "sum",
        vec![InputBinding::dependency("numbers", "numbers")],
        OutputDef::NoMaterialization,
        |inputs: &Inputs, _: &ExecutionContext| {
            let total: f64 = numbers_of(inputs, "numbers")?.iter().sum();
            Ok(json!(total))
        },
    )?;

    let count = Node::new(
        "count",
        vec![InputBinding::dependency("numbers", "numbers")],
        OutputDef::NoMaterialization,
        |inputs: &Inputs, _: &ExecutionContext| Ok(json!(numbers_of(inputs, "numbers")?.len())),
    )?;

    let mean = Node::new(
        "mean",
        vec![
            InputBinding::dependency("sum", "sum"),
            InputBinding::dependency("count", "count"),
        ],
        OutputDef::logged(),
        |inputs: &Inputs, context: &ExecutionContext| {
            let sum = number_of(inputs, "sum")?;
            let count = number_of(inputs, "count")?;
            if count == 0.0 {
                return Err(TransformError::new("mean of an empty list"));
            }
            context.debug(&format!("mean = {} / {}", sum, count));
            Ok(json!(sum / count))
        },
    )?;

    Ok(Graph::build("arithmetic", vec![numbers, sum, count, mean])?
        .with_description("Sum, count and mean of environment-supplied numbers")
        .into())
}

/// text -> words -> (word_count, longest_word)
pub fn text() -> Result<Produced, GraphError> {
    let source = Node::new(
        "text",
        vec![InputBinding::external(
            "text",
            |args: &Map<String, Value>| {
                let text = args
                    .get("text")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| SourceError::new("text must be a string"))?;
                let lowercase = args.get("lowercase").and_then(|v| v.as_bool()) == Some(true);
                if lowercase {
                    Ok(json!(text.to_lowercase()))
                } else {
                    Ok(json!(text))
                }
            },
            TEXT_SCHEMA.clone(),
        )],
        OutputDef::NoMaterialization,
        |inputs: &Inputs, _: &ExecutionContext| Ok(inputs.require("text")?.clone()),
    )?;

    let words = Node::new(
        "words",
        vec![InputBinding::dependency("text", "text")],
        OutputDef::NoMaterialization,
        |inputs: &Inputs, _: &ExecutionContext| {
            let text = inputs
                .require("text")?
                .as_str()
                .ok_or_else(|| TransformError::new("text is not a string"))?;
            let words: Vec<&str> = text.split_whitespace().collect();
            Ok(json!(words))
        },
    )?;

    let word_count = Node::new(
        "word_count",
        vec![InputBinding::dependency("words", "words")],
        OutputDef::logged(),
        |inputs: &Inputs, _: &ExecutionContext| {
            let words = inputs
                .require("words")?
                .as_array()
                .ok_or_else(|| TransformError::new("words is not a list"))?;
            Ok(json!(words.len()))
        },
    )?;

    let longest_word = Node::new(
        "longest_word",
        vec![InputBinding::dependency("words", "words")],
        OutputDef::logged(),
        |inputs: &Inputs, _: &ExecutionContext| {
            let longest = inputs
                .require("words")?
                .as_array()
                .ok_or_else(|| TransformError::new("words is not a list"))?
                .iter()
                .filter_map(|w| w.as_str())
                .fold("", |best, w| if w.len() > best.len() { w } else { best })
                .to_string();
            Ok(json!(longest))
        },
    )?;

    Ok(
        Graph::build("text", vec![source, words, word_count, longest_word])?
            .with_description("Word statistics for environment-supplied text")
            .into(),
    )
}
