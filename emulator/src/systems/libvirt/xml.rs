// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Element tree of a domain configuration document.
//!
//! Domain documents carry no mixed content, so an element holds either
//! text or child elements. Comments, processing instructions and the
//! declaration are dropped on parse.

use quick_xml::escape::escape;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError(String);

impl XmlError {
    fn new(reason: impl Display) -> Self {
        Self(reason.to_string())
    }
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "malformed domain document: {}", self.0)
    }
}

impl StdError for XmlError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) => *current = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Returns true if the attribute was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(key, _)| key != name);
        before != self.attributes.len()
    }

    /// First child element named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// First child element named `name`, appended if there is none.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Self {
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Self::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Self> + 'a {
        self.children.iter_mut().filter(move |child| child.name == name)
    }

    /// Remove every child element named `name`. Returns the number
    /// removed.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.name != name);
        before - self.children.len()
    }

    /// Insert `child` right after the last child named `after`, or append
    /// it if there is none.
    pub fn insert_after(&mut self, after: &str, child: Self) {
        match self.children.iter().rposition(|c| c.name == after) {
            Some(index) => self.children.insert(index + 1, child),
            None => self.children.push(child),
        }
    }

    /// Parse a document into its root element.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not well formed.
    pub fn parse(document: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(document);
        let mut stack: Vec<Self> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event().map_err(XmlError::new)? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::close(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::new("unexpected end tag"))?;
                    Self::close(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.decode().map_err(XmlError::new)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(std::str::from_utf8(&data).map_err(XmlError::new)?);
                    }
                }
                Event::GeneralRef(reference) => {
                    let resolved = match reference.resolve_char_ref().map_err(XmlError::new)? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = reference.decode().map_err(XmlError::new)?;
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| XmlError::new(format!("unknown entity &{name};")))?
                                .to_string()
                        }
                    };
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&resolved);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if let Some(open) = stack.last() {
            return Err(XmlError::new(format!("unclosed element {}", open.name)));
        }
        root.ok_or_else(|| XmlError::new("no root element"))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(XmlError::new)?
            .to_string();
        let mut element = Self::new(name);
        for attribute in start.attributes() {
            let attribute = attribute.map_err(XmlError::new)?;
            let key = std::str::from_utf8(attribute.key.as_ref()).map_err(XmlError::new)?;
            let value = attribute.unescape_value().map_err(XmlError::new)?;
            element.attributes.push((key.to_string(), value.into_owned()));
        }
        Ok(element)
    }

    fn close(stack: &mut Vec<Self>, root: &mut Option<Self>, mut element: Self) -> Result<(), XmlError> {
        if !element.children.is_empty() || element.text.trim().is_empty() {
            element.text = element.text.trim().to_string();
        }
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => return Err(XmlError::new("more than one root element")),
        }
        Ok(())
    }

    /// Serialize with two-space indentation.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() && self.text.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        if self.children.is_empty() {
            out.push_str(&escape(self.text.as_str()));
        } else {
            out.push('\n');
            if !self.text.is_empty() {
                out.push_str(&indent);
                out.push_str("  ");
                out.push_str(&escape(self.text.as_str()));
                out.push('\n');
            }
            for child in &self.children {
                child.write(out, depth + 1);
            }
            out.push_str(&indent);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}
