//! Embedded starter plans.
//!
//! Each template is a complete plan in the same markup dialect the model
//! emits, so a session can ingest a starter with the exact code path a
//! model reply takes. The model is then asked to revise the resulting
//! tree instead of starting from nothing.

use super::TemplateKind;

/// Return the starter plan markup for a template kind.
pub fn starter_plan(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Node => NODE_STARTER,
        TemplateKind::React => REACT_STARTER,
    }
}

/// Minimal Node project: a manifest, an entrypoint, and an install step.
pub const NODE_STARTER: &str = r#"<weftArtifact id="node-starter" title="Node.js starter">
<weftAction type="file" filePath="package.json">{
  "name": "node-starter",
  "private": true,
  "version": "0.0.0",
  "type": "module",
  "scripts": {
    "start": "node index.js"
  }
}
</weftAction>
<weftAction type="file" filePath="index.js">console.log('Hello from Node.js!');
</weftAction>
<weftAction type="shell">npm install</weftAction>
</weftArtifact>"#;

/// Minimal React + Vite project.
pub const REACT_STARTER: &str = r#"<weftArtifact id="react-starter" title="React starter">
<weftAction type="file" filePath="package.json">{
  "name": "react-starter",
  "private": true,
  "version": "0.0.0",
  "type": "module",
  "scripts": {
    "dev": "vite",
    "build": "vite build",
    "preview": "vite preview"
  },
  "dependencies": {
    "react": "^18.3.1",
    "react-dom": "^18.3.1"
  },
  "devDependencies": {
    "@vitejs/plugin-react": "^4.3.1",
    "vite": "^5.4.2"
  }
}
</weftAction>
<weftAction type="file" filePath="vite.config.js">import { defineConfig } from 'vite';
import react from '@vitejs/plugin-react';

export default defineConfig({
  plugins: [react()],
});
</weftAction>
<weftAction type="file" filePath="index.html"><!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>React Starter</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.jsx"></script>
  </body>
</html>
</weftAction>
<weftAction type="file" filePath="src/main.jsx">import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App.jsx';

ReactDOM.createRoot(document.getElementById('root')).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>
);
</weftAction>
<weftAction type="file" filePath="src/App.jsx">function App() {
  return <h1>Hello from React!</h1>;
}

export default App;
</weftAction>
<weftAction type="shell">npm install</weftAction>
</weftArtifact>"#;
