#[cfg(test)]
mod tests {
    fn tool(name: &str) -> serde_json::Value {
        let tools = crate::mcp::build_tools_array();
        tools
            .as_array()
            .expect("tools array")
            .iter()
            .find(|t| t.get("name").and_then(|n| n.as_str()) == Some(name))
            .cloned()
            .unwrap_or_else(|| panic!("{} tool present", name))
    }

    fn required(schema: &serde_json::Value) -> Vec<String> {
        schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn search_schema_requires_query_only() {
        let search = tool("search");
        let schema = search.get("inputSchema").expect("search schema");

        assert_eq!(required(schema), vec!["query".to_string()]);

        let properties = schema.get("properties").expect("properties object");
        assert!(properties.get("query").is_some());
        assert!(
            properties.get("limit").is_some(),
            "limit should exist as an optional property"
        );
    }

    #[tokio::test]
    async fn suggest_schema_requires_prefix_only() {
        let suggest = tool("suggest");
        let schema = suggest.get("inputSchema").expect("suggest schema");

        assert_eq!(required(schema), vec!["prefix".to_string()]);
    }

    #[tokio::test]
    async fn search_description_mentions_notations() {
        let search = tool("search");
        let schema_str = serde_json::to_string(&search["inputSchema"]).unwrap();
        assert!(schema_str.contains("e13-1234-5678-00"));
        assert!(schema_str.contains("e131234567800"));
    }
}
