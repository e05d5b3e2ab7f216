//! # Built-in Lab Catalog
//!
//! Step definitions for the seven hands-on labs, one entry per
//! `docs/labs/*.md` guide. Ids match the checkboxes in each guide.

use crate::{LabDefinition, LabLayer, LabStep, Tier};

fn steps(defs: &[(&str, &str)]) -> Vec<LabStep> {
    defs.iter().map(|(id, label)| LabStep::new(*id, *label)).collect()
}

fn layer(id: u32, tier: Tier, title: &str, defs: &[(&str, &str)]) -> LabLayer {
    LabLayer {
        id,
        title: title.to_string(),
        tier,
        steps: steps(defs),
    }
}

fn lab(
    lab_id: &str,
    guide_file: &str,
    setup: &[(&str, &str)],
    layers: Vec<LabLayer>,
) -> LabDefinition {
    LabDefinition {
        lab_id: lab_id.to_string(),
        guide_file: guide_file.to_string(),
        setup: steps(setup),
        layers,
    }
}

/// The built-in lab definitions, in display order.
pub(crate) fn definitions() -> Vec<LabDefinition> {
    vec![
        // GenAI Lab
        lab(
            "generative",
            "docs/labs/01-genai.md",
            &[
                ("setup-openai-resource", "Create Azure OpenAI resource"),
                ("setup-deploy-gpt", "Deploy gpt-4o-mini in Azure AI Foundry"),
                ("setup-deploy-dalle", "Deploy dall-e-3 in Azure AI Foundry"),
                ("setup-env-openai", "Configure backend/.env with keys and endpoints"),
                ("setup-restart-backend", "Restart backend server"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Chat Completion",
                    &[
                        ("l1-get-client", "Implement _get_client() helper function"),
                        ("l1-chat-completion", "Implement chat_completion() function"),
                        ("l1-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Parameter Tuning",
                    &[
                        ("l2-add-params", "Add all tuning parameters to chat_completion() API call"),
                        ("l2-test", "Test with different temperature/max_tokens values"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "DALL-E Image Generation",
                    &[
                        ("l3-generate-image", "Implement generate_image() function"),
                        ("l3-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    4,
                    Tier::Advanced,
                    "Streaming Responses",
                    &[
                        ("l4-stream-impl", "Implement streaming chat completion with stream=True"),
                        ("l4-stream-sse", "Return Server-Sent Events (SSE) from the FastAPI endpoint"),
                        ("l4-stream-test", "Test streaming output in the frontend"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Token Counting & Cost Estimation",
                    &[
                        ("l5-tiktoken", "Use tiktoken to count prompt/completion tokens"),
                        ("l5-usage-response", "Return token usage and estimated cost in API response"),
                        ("l5-test", "Verify token counts match Azure usage metadata"),
                    ],
                ),
                layer(
                    6,
                    Tier::Expert,
                    "Entra ID Authentication & Governance",
                    &[
                        ("l6-entra-concept", "Review Entra ID (AAD) auth flow for Azure OpenAI"),
                        ("l6-rbac-roles", "Understand RBAC roles: Cognitive Services User vs Contributor"),
                        ("l6-managed-identity", "Review managed identity patterns for production deployments"),
                        ("l6-questions", "Answer self-check questions on authentication"),
                    ],
                ),
            ],
        ),
        // RAG Engine
        lab(
            "rag",
            "docs/labs/02-rag.md",
            &[
                ("setup-search-resource", "Create Azure AI Search resource"),
                ("setup-search-index", "Create search index (ai102-index) in portal"),
                ("setup-env-search", "Configure backend/.env with search endpoint and key"),
                ("setup-restart-backend", "Restart backend server"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Create Search Index",
                    &[
                        ("l1-create-index", "Create index with required fields in Azure Portal"),
                        ("l1-verify-index", "Verify index exists with 0 documents"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Upload Documents",
                    &[
                        ("l2-imports", "Add SDK imports to search_service.py"),
                        ("l2-get-client", "Implement _get_search_client() helper"),
                        ("l2-upload", "Implement upload_document() function"),
                        ("l2-test", "Test upload via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "Basic Search",
                    &[
                        ("l3-search", "Implement search_documents() function"),
                        ("l3-test", "Test search via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    4,
                    Tier::Core,
                    "Chunking Strategy",
                    &[
                        ("l4-chunk-helper", "Add _chunk_text() helper function"),
                        ("l4-chunking-logic", "Enhance upload_document() with chunking logic"),
                        ("l4-test", "Test with a large document"),
                    ],
                ),
                layer(
                    5,
                    Tier::Core,
                    "Vector Search (Conceptual)",
                    &[
                        ("l5-review", "Review vector search concepts"),
                        ("l5-questions", "Answer self-check questions"),
                    ],
                ),
                layer(
                    6,
                    Tier::Core,
                    "Grounded Chat (RAG)",
                    &[
                        ("l6-rag-toggle", "Verify RAG toggle works on /generative page"),
                        ("l6-test-grounded", "Test grounded response with uploaded documents"),
                        ("l6-test-unrelated", "Test unrelated question — model should say context is insufficient"),
                    ],
                ),
                layer(
                    7,
                    Tier::Advanced,
                    "Semantic Ranking",
                    &[
                        ("l7-semantic-config", "Configure semantic ranking on the search index"),
                        ("l7-semantic-query", "Update search_documents() to use query_type='semantic'"),
                        ("l7-compare", "Compare keyword vs semantic results for the same query"),
                    ],
                ),
                layer(
                    8,
                    Tier::Advanced,
                    "Vector Search with Embeddings",
                    &[
                        ("l8-embed-func", "Implement get_embedding() using Azure OpenAI embeddings model"),
                        ("l8-vector-field", "Add vector field to search index schema"),
                        ("l8-vector-upload", "Generate and store embeddings during document upload"),
                        ("l8-vector-query", "Implement vector search using VectorizedQuery"),
                    ],
                ),
                layer(
                    9,
                    Tier::Expert,
                    "Hybrid Search & Reranking Strategies",
                    &[
                        ("l9-hybrid-concept", "Review hybrid search (keyword + vector + semantic) architecture"),
                        ("l9-rrf", "Understand Reciprocal Rank Fusion (RRF) scoring"),
                        ("l9-reranker", "Review cross-encoder reranking patterns for production RAG"),
                        ("l9-questions", "Answer self-check questions on search strategies"),
                    ],
                ),
            ],
        ),
        // Knowledge Mining
        lab(
            "search",
            "docs/labs/03-knowledge-mining.md",
            &[
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Index Management",
                    &[
                        ("l1-review-clients", "Review SearchIndexClient vs SearchClient concepts"),
                        ("l1-understand-fields", "Understand field types, analyzers, and scoring profiles"),
                        ("l1-optional-index", "(Optional) Create a second index programmatically"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Data Sources and Indexers",
                    &[
                        ("l2-review-pipeline", "Review indexer pipeline concepts"),
                        ("l2-change-detection", "Understand change detection policies"),
                        ("l2-optional-wizard", "(Optional) Set up an indexer via Import data wizard"),
                        ("l2-questions", "Answer self-check questions"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "AI Enrichment with Skillsets",
                    &[
                        ("l3-review-skills", "Review built-in cognitive skills and their inputs/outputs"),
                        ("l3-context-chaining", "Understand skillset context and chaining"),
                        ("l3-custom-skills", "Review custom skills (WebApiSkill) schema"),
                        ("l3-questions", "Answer self-check questions"),
                    ],
                ),
                layer(
                    4,
                    Tier::Core,
                    "Advanced Query Syntax",
                    &[
                        ("l4-add-filter-facets", "Add filter_expr and facets parameters to search_documents()"),
                        ("l4-lucene", "Review simple vs full Lucene query syntax"),
                        ("l4-odata", "Review OData filter expressions"),
                        ("l4-questions", "Answer self-check questions"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Knowledge Store Projections",
                    &[
                        ("l5-projection-types", "Review table, object, and file projections"),
                        ("l5-shaper-skill", "Understand Shaper skill for projection shaping"),
                        ("l5-storage-output", "Review knowledge store output in Azure Storage"),
                    ],
                ),
                layer(
                    6,
                    Tier::Advanced,
                    "Custom Skills & Azure Functions",
                    &[
                        ("l6-webapi-schema", "Review WebApiSkill request/response contract"),
                        ("l6-function-impl", "Design a custom skill Azure Function (conceptual)"),
                        ("l6-skill-integration", "Understand custom skill integration in a skillset pipeline"),
                    ],
                ),
                layer(
                    7,
                    Tier::Expert,
                    "Incremental Enrichment & Debugging",
                    &[
                        ("l7-incremental", "Review incremental enrichment and caching strategies"),
                        ("l7-debug-sessions", "Understand debug sessions for skillset troubleshooting"),
                        ("l7-field-mappings", "Review output field mappings and common pitfalls"),
                        ("l7-questions", "Answer self-check questions on indexer debugging"),
                    ],
                ),
            ],
        ),
        // Vision Lab
        lab(
            "vision",
            "docs/labs/04-vision.md",
            &[
                ("setup-ai-services", "Create Azure AI Services multi-service resource"),
                ("setup-env-vision", "Configure backend/.env with endpoint and key"),
                ("setup-restart-backend", "Restart backend server"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Image Analysis",
                    &[
                        ("l1-imports", "Add SDK imports to vision_service.py"),
                        ("l1-get-client", "Implement _get_client() helper"),
                        ("l1-analyze", "Implement analyze_image() with description and tags"),
                        ("l1-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Object Detection",
                    &[
                        ("l2-add-objects", "Add VisualFeatureTypes.objects to analyze_image()"),
                        ("l2-parse-bbox", "Parse bounding box data from response"),
                        ("l2-test", "Test with image containing multiple objects"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "OCR with the Read API",
                    &[
                        ("l3-ocr", "Implement ocr_image() with async Read API"),
                        ("l3-polling", "Implement polling loop for operation completion"),
                        ("l3-test", "Test with image containing text"),
                    ],
                ),
                layer(
                    4,
                    Tier::Advanced,
                    "Custom Vision Models",
                    &[
                        ("l4-project-types", "Review Custom Vision project types (classification vs detection)"),
                        ("l4-training-workflow", "Understand training, iteration, and publishing workflow"),
                        ("l4-prediction-api", "Review prediction endpoint SDK patterns"),
                        ("l4-test", "Plan a Custom Vision project for a sample use case"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Image Analysis 4.0 Features",
                    &[
                        ("l5-dense-captions", "Review dense captions and smart cropping features"),
                        ("l5-people-detection", "Understand people detection and background removal"),
                        ("l5-custom-model", "Review custom model training with Florence foundation"),
                    ],
                ),
                layer(
                    6,
                    Tier::Expert,
                    "Face API & Spatial Analysis",
                    &[
                        ("l6-face-detect", "Review Face API detection, verification, and identification"),
                        ("l6-face-groups", "Understand PersonGroup and LargePersonGroup management"),
                        ("l6-spatial", "Review spatial analysis patterns for video/camera scenarios"),
                        ("l6-questions", "Answer self-check questions on vision architecture"),
                    ],
                ),
            ],
        ),
        // Language & Speech
        lab(
            "language",
            "docs/labs/05-language.md",
            &[
                ("setup-ai-services", "Set up Azure AI Services multi-service resource"),
                ("setup-translator", "Configure Translator key and region in backend/.env"),
                ("setup-speech", "Configure Speech key and region in backend/.env"),
                ("setup-restart-backend", "Restart backend server"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Sentiment Analysis",
                    &[
                        ("l1-imports", "Add SDK imports to language_service.py"),
                        ("l1-get-client", "Implement _get_text_client() helper"),
                        ("l1-sentiment", "Implement analyze_text() with sentiment analysis"),
                        ("l1-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "NLP Features",
                    &[
                        ("l2-keyphrases", "Add key phrase extraction to analyze_text()"),
                        ("l2-entities", "Add entity recognition to analyze_text()"),
                        ("l2-pii", "Add PII detection to analyze_text()"),
                        ("l2-language", "Add language detection to analyze_text()"),
                        ("l2-test", "Test each analysis type"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "Translation",
                    &[
                        ("l3-translate", "Implement translate_text() with Translator REST API"),
                        ("l3-test", "Test translation between multiple language pairs"),
                    ],
                ),
                layer(
                    4,
                    Tier::Core,
                    "Speech Services",
                    &[
                        ("l4-stt", "Implement speech_to_text() with Speech REST API"),
                        ("l4-tts", "Implement text_to_speech() with SSML"),
                        ("l4-test-stt", "Test STT with a WAV audio file"),
                        ("l4-test-tts", "Test TTS and verify audio playback"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Custom NER & Conversational Language Understanding",
                    &[
                        ("l5-custom-ner", "Review custom NER project lifecycle (label, train, deploy)"),
                        ("l5-clu-intents", "Understand CLU intents, entities, and utterances"),
                        ("l5-clu-deploy", "Review CLU deployment slots and prediction API"),
                    ],
                ),
                layer(
                    6,
                    Tier::Advanced,
                    "Custom Speech & Voice",
                    &[
                        ("l6-custom-stt", "Review custom speech model training and endpoints"),
                        ("l6-pronunciation", "Understand pronunciation assessment API"),
                        ("l6-custom-voice", "Review custom neural voice creation workflow"),
                    ],
                ),
                layer(
                    7,
                    Tier::Expert,
                    "Document Translation & Orchestration Workflow",
                    &[
                        ("l7-doc-translate", "Review batch document translation with Azure Translator"),
                        ("l7-orchestration", "Understand orchestration workflow for routing to CLU/QnA/LUIS"),
                        ("l7-multi-region", "Review multi-region deployment patterns for language services"),
                        ("l7-questions", "Answer self-check questions on language architecture"),
                    ],
                ),
            ],
        ),
        // Agent Workshop
        lab(
            "agents",
            "docs/labs/06-agents.md",
            &[
                ("setup-verify-openai", "Verify Lab 01 Azure OpenAI resource is working"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "System Instructions",
                    &[
                        ("l1-system-msg", "Build system message with instructions and tool list"),
                        ("l1-api-call", "Call Chat Completions API with system message"),
                        ("l1-return-dict", "Return result as dict with \"message\" and \"tool_calls\" keys"),
                        ("l1-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Simulated Tool Calls",
                    &[
                        ("l2-regex", "Add regex parsing for [TOOL: ...] patterns"),
                        ("l2-tool-list", "Build tool_calls list from parsed matches"),
                        ("l2-clean", "Clean tool patterns from display content"),
                        ("l2-test", "Test with prompts that trigger tool usage"),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "Grounding with Knowledge Sources",
                    &[
                        ("l3-review", "Review grounding concepts (RAG, code interpreter, function calling)"),
                        ("l3-foundry", "Understand Foundry Agent Service capabilities"),
                        ("l3-questions", "Answer self-check questions"),
                    ],
                ),
                layer(
                    4,
                    Tier::Advanced,
                    "Function Calling with Tool Definitions",
                    &[
                        ("l4-tool-schema", "Define tools array with JSON Schema function parameters"),
                        ("l4-tool-choice", "Implement tool_choice options (auto, required, none)"),
                        ("l4-tool-loop", "Build the tool-call-response loop pattern"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Multi-Agent Patterns",
                    &[
                        ("l5-routing", "Review routing agent pattern for task delegation"),
                        ("l5-handoff", "Understand agent handoff and context passing"),
                        ("l5-foundry-agents", "Review Foundry Agent Service multi-agent orchestration"),
                    ],
                ),
                layer(
                    6,
                    Tier::Expert,
                    "Code Interpreter & File Search",
                    &[
                        ("l6-code-interpreter", "Review code interpreter tool capabilities and sandbox"),
                        ("l6-file-search", "Understand file search tool with vector stores"),
                        ("l6-assistants-api", "Review Assistants API thread and run lifecycle"),
                        ("l6-questions", "Answer self-check questions on agent architecture"),
                    ],
                ),
            ],
        ),
        // Responsible AI
        lab(
            "responsible-ai",
            "docs/labs/07-responsible-ai.md",
            &[
                ("setup-content-safety", "Create Azure Content Safety resource"),
                ("setup-env-safety", "Configure backend/.env with Content Safety endpoint and key"),
                ("setup-restart-backend", "Restart backend server"),
            ],
            vec![
                layer(
                    1,
                    Tier::Core,
                    "Content Safety Analysis",
                    &[
                        ("l1-imports", "Add SDK imports to safety_service.py"),
                        ("l1-get-client", "Implement _get_client() helper"),
                        ("l1-analyze", "Implement analyze_text() with four safety categories"),
                        ("l1-test", "Test via frontend or Swagger UI"),
                    ],
                ),
                layer(
                    2,
                    Tier::Core,
                    "Severity Levels",
                    &[
                        ("l2-severity-label", "Implement _severity_label() helper function"),
                        ("l2-update-analyze", "Update analyze_text() to use human-readable labels"),
                        ("l2-test", "Test — verify labels show \"Safe\" instead of \"0\""),
                    ],
                ),
                layer(
                    3,
                    Tier::Core,
                    "Prompt Shield",
                    &[
                        ("l3-check-prompt", "Implement check_prompt() with severity threshold logic"),
                        ("l3-test-safe", "Test with safe prompts — should return flagged: false"),
                        ("l3-test-harmful", "Test with harmful content — should return flagged: true"),
                    ],
                ),
                layer(
                    4,
                    Tier::Advanced,
                    "Custom Blocklists",
                    &[
                        ("l4-blocklist-create", "Review blocklist creation and item management API"),
                        ("l4-blocklist-analyze", "Understand how to use blocklists in text analysis"),
                        ("l4-blocklist-patterns", "Design blocklist strategy for a production scenario"),
                    ],
                ),
                layer(
                    5,
                    Tier::Advanced,
                    "Groundedness Detection",
                    &[
                        ("l5-groundedness-api", "Review groundedness detection API and scoring"),
                        ("l5-hallucination", "Understand hallucination detection in RAG pipelines"),
                        ("l5-integration", "Design integration pattern for grounded response validation"),
                    ],
                ),
                layer(
                    6,
                    Tier::Expert,
                    "RAI Governance & Compliance",
                    &[
                        ("l6-rai-principles", "Review Microsoft Responsible AI principles and practices"),
                        ("l6-transparency-notes", "Understand transparency notes and impact assessments"),
                        ("l6-content-filtering", "Review Azure OpenAI content filtering configuration"),
                        ("l6-questions", "Answer self-check questions on RAI governance"),
                    ],
                ),
            ],
        ),
    ]
}
