// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostScript Printer Description (PPD) reader.
//
// Only the UI structure is read: groups, sub-groups, options, their choices
// and defaults. Choice bodies (PostScript/JCL code) are skipped.

use std::collections::{BTreeMap, HashMap};

use spoolkit_core::types::OptionNode;

/// Group that collects options declared outside any `*OpenGroup`.
pub const GENERAL_GROUP: &str = "General";

/// An option whose `*OpenUI` has been seen but not its `*CloseUI`.
struct OpenOption {
    keyword: String,
    choices: Vec<OptionNode>,
}

/// Parse `text` into an option tree rooted at a group named `root`.
///
/// Choices are marked from the file's `*Default<keyword>` entries.
pub fn parse_ppd(root: &str, text: &str) -> OptionNode {
    // Stack of open groups; index 0 is the root.
    let mut groups: Vec<(String, Vec<OptionNode>)> = vec![(root.to_string(), Vec::new())];
    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut option: Option<OpenOption> = None;
    // Options outside any group, and where their group sits among the root's
    // children.
    let mut ungrouped: Vec<OptionNode> = Vec::new();
    let mut ungrouped_at: Option<usize> = None;
    let mut in_quote = false;

    for line in text.lines() {
        // Continuation of a multi-line quoted value.
        if in_quote {
            in_quote = line.matches('"').count() % 2 == 0;
            continue;
        }
        if !line.starts_with('*') || line.starts_with("*%") {
            continue;
        }
        if line.matches('"').count() % 2 == 1 {
            in_quote = true;
        }

        let (key, value) = match line[1..].split_once(':') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (line[1..].trim(), ""),
        };
        // `OpenUI *PageSize/Media Size` → (`OpenUI`, `*PageSize/Media Size`).
        let (directive, rest) = match key.split_once(char::is_whitespace) {
            Some((d, r)) => (d, r.trim()),
            None => (key, ""),
        };

        match directive {
            "OpenGroup" | "OpenSubGroup" => {
                groups.push((translation_key(value).to_string(), Vec::new()));
            }
            "CloseGroup" | "CloseSubGroup" => {
                if groups.len() > 1
                    && let Some((name, children)) = groups.pop()
                {
                    push_child(&mut groups, OptionNode::group(name, children));
                }
            }
            "OpenUI" | "JCLOpenUI" => {
                let keyword = translation_key(rest.trim_start_matches('*'));
                option = Some(OpenOption {
                    keyword: keyword.to_string(),
                    choices: Vec::new(),
                });
            }
            "CloseUI" | "JCLCloseUI" => {
                if let Some(done) = option.take() {
                    let node = OptionNode::group(done.keyword, done.choices);
                    if groups.len() == 1 {
                        ungrouped_at.get_or_insert(groups[0].1.len());
                        ungrouped.push(node);
                    } else {
                        push_child(&mut groups, node);
                    }
                }
            }
            _ => {
                if rest.is_empty() {
                    if let Some(keyword) = directive.strip_prefix("Default") {
                        defaults.insert(keyword.to_string(), value.to_string());
                    }
                    continue;
                }
                // Choice line: `*Keyword Choice/Text: "code"`.
                if let Some(open) = option.as_mut()
                    && directive == open.keyword
                {
                    open.choices.push(OptionNode::leaf(translation_key(rest), false));
                }
            }
        }
    }

    // Unterminated groups are closed in order.
    while groups.len() > 1 {
        if let Some((name, children)) = groups.pop() {
            push_child(&mut groups, OptionNode::group(name, children));
        }
    }

    let (name, mut children) = groups.remove(0);
    if let Some(at) = ungrouped_at {
        // A declared General group absorbs the ungrouped options.
        let declared = children
            .iter()
            .position(|c| matches!(c, OptionNode::Group { name, .. } if name == GENERAL_GROUP));
        match declared {
            Some(index) => {
                if let OptionNode::Group { children: general, .. } = &mut children[index] {
                    let rest = std::mem::replace(general, ungrouped);
                    general.extend(rest);
                }
            }
            None => children.insert(at, OptionNode::group(GENERAL_GROUP, ungrouped)),
        }
    }
    let mut tree = OptionNode::group(name, children);
    mark_options(&mut tree, &defaults);
    tree
}

/// Re-mark choices from `selected` (keyword → choice). Options absent from
/// `selected` keep their current marks.
pub fn mark_options<S: std::hash::BuildHasher>(
    tree: &mut OptionNode,
    selected: &HashMap<String, String, S>,
) {
    if let OptionNode::Group { name, children } = tree {
        let is_option =
            !children.is_empty() && children.iter().all(|c| matches!(c, OptionNode::Leaf { .. }));
        if is_option {
            if let Some(value) = selected.get(name.as_str()) {
                for child in children.iter_mut() {
                    if let OptionNode::Leaf { choice, marked } = child {
                        *marked = choice == value;
                    }
                }
            }
            return;
        }
        for child in children.iter_mut() {
            mark_options(child, selected);
        }
    }
}

/// Parse a PPD payload as received from the service.
///
/// PPDs are often Latin-1; keywords are ASCII, so undecodable bytes in
/// translation strings are replaced rather than rejected.
pub fn parse_ppd_bytes(root: &str, bytes: &[u8]) -> OptionNode {
    parse_ppd(root, &String::from_utf8_lossy(bytes))
}

/// Mark choices from destination options that name a PPD keyword.
pub fn mark_from_destination(tree: &mut OptionNode, options: &BTreeMap<String, String>) {
    let selected: HashMap<String, String> =
        options.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    mark_options(tree, &selected);
}

/// `Keyword/Translation` → `Keyword`.
fn translation_key(value: &str) -> &str {
    value.split('/').next().unwrap_or(value).trim()
}

fn push_child(groups: &mut [(String, Vec<OptionNode>)], node: OptionNode) {
    if let Some((_, children)) = groups.last_mut() {
        children.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"*PPD-Adobe: "4.3"
*% Comment lines are ignored
*ModelName: "Office Laser"
*OpenUI *ColorModel/Color Mode: PickOne
*DefaultColorModel: Gray
*ColorModel Gray/Grayscale: "<</cupsColorSpace 0>>setpagedevice"
*ColorModel RGB/Color: "<</cupsColorSpace 1>>setpagedevice"
*CloseUI: *ColorModel
*OpenGroup: General/General
*OpenUI *PageSize/Media Size: PickOne
*OrderDependency: 10 AnySetup *PageSize
*DefaultPageSize: Letter
*PageSize Letter/US Letter: "<</PageSize[612 792]>>setpagedevice"
*PageSize A4/A4: "<</PageSize[595 842]
  /ImagingBBox null>>setpagedevice"
*End
*CloseUI: *PageSize
*OpenSubGroup: Finishing/Finishing
*OpenUI *Duplex/2-Sided: PickOne
*DefaultDuplex: None
*Duplex None/Off: ""
*Duplex DuplexNoTumble/Long Edge: ""
*CloseUI: *Duplex
*CloseSubGroup: Finishing
*CloseGroup: General
"#;

    #[test]
    fn root_is_named_after_printer() {
        let tree = parse_ppd("Office-Laser", SAMPLE);
        assert_eq!(tree.name(), "Office-Laser");
    }

    #[test]
    fn ungrouped_options_merge_into_general() {
        let tree = parse_ppd("Office-Laser", SAMPLE);
        let general: Vec<_> = tree
            .children()
            .iter()
            .filter(|c| c.name() == GENERAL_GROUP)
            .collect();
        assert_eq!(general.len(), 1);
        let names: Vec<_> = general[0].children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ColorModel", "PageSize", "Finishing"]);
    }

    #[test]
    fn ungrouped_general_created_when_not_declared() {
        let text = "*OpenUI *Resolution: PickOne\n*DefaultResolution: 600dpi\n*Resolution 600dpi: \"\"\n*CloseUI: *Resolution\n";
        let tree = parse_ppd("Label", text);
        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.children()[0].name(), GENERAL_GROUP);
        assert_eq!(tree.marked_choice("Resolution"), Some("600dpi"));
    }

    #[test]
    fn defaults_marked() {
        let tree = parse_ppd("Office-Laser", SAMPLE);
        assert_eq!(tree.marked_choice("PageSize"), Some("Letter"));
        assert_eq!(tree.marked_choice("ColorModel"), Some("Gray"));
        assert_eq!(tree.marked_choice("Duplex"), Some("None"));
    }

    #[test]
    fn multi_line_choice_body_skipped() {
        let tree = parse_ppd("Office-Laser", SAMPLE);
        let choices: Vec<_> = tree
            .find_option("PageSize")
            .map(|o| o.children().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        assert_eq!(choices, vec!["Letter", "A4"]);
    }

    #[test]
    fn sub_groups_nested() {
        let tree = parse_ppd("Office-Laser", SAMPLE);
        let map = tree.to_choice_map();
        assert!(map.contains_key("Duplex"));
        assert_eq!(map["Duplex"].get("DuplexNoTumble"), Some(&false));
    }

    #[test]
    fn options_declared_inside_groups_keep_choices() {
        let text = "*OpenGroup: General/General\n\
*OpenUI *PageSize/Media Size: PickOne\n\
*DefaultPageSize: A4\n\
*PageSize A4/A4: \"\"\n\
*PageSize Letter/US Letter: \"\"\n\
*CloseUI: *PageSize\n\
*CloseGroup: General\n";
        let tree = parse_ppd("P", text);
        assert_eq!(tree.marked_choice("PageSize"), Some("A4"));
        let map = tree.to_choice_map();
        assert_eq!(map["PageSize"].get("A4"), Some(&true));
        assert_eq!(map["PageSize"].get("Letter"), Some(&false));
    }

    #[test]
    fn jcl_options_read() {
        let text = "*JCLOpenUI *JCLDuplex/Duplex: PickOne\n\
*DefaultJCLDuplex: Off\n\
*JCLDuplex Off/Off: \"\"\n\
*JCLDuplex On/On: \"\"\n\
*JCLCloseUI: *JCLDuplex\n";
        let tree = parse_ppd("P", text);
        assert_eq!(tree.marked_choice("JCLDuplex"), Some("Off"));
    }

    #[test]
    fn latin1_translations_tolerated() {
        let mut bytes = b"*LanguageEncoding: ISOLatin1\n\
*OpenUI *PageSize/Media Size: PickOne\n\
*DefaultPageSize: A4\n\
*PageSize A4/Gr".to_vec();
        bytes.push(0xF6);
        bytes.extend_from_slice(b"\xDFe A4: \"\"\n*CloseUI: *PageSize\n");
        assert!(std::str::from_utf8(&bytes).is_err());

        let tree = parse_ppd_bytes("P", &bytes);
        assert_eq!(tree.marked_choice("PageSize"), Some("A4"));
    }

    #[test]
    fn destination_options_override_defaults() {
        let mut tree = parse_ppd("Office-Laser", SAMPLE);
        let mut options = BTreeMap::new();
        options.insert("PageSize".to_string(), "A4".to_string());
        options.insert("printer-state".to_string(), "3".to_string());
        mark_from_destination(&mut tree, &options);
        assert_eq!(tree.marked_choice("PageSize"), Some("A4"));
        assert_eq!(tree.marked_choice("ColorModel"), Some("Gray"));
    }
}
